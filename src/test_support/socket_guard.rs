//! Skip network-backed tests where loopback sockets are not permitted.

use wiremock::MockServer;

/// Returns true when a loopback TCP listener can be bound.
pub(crate) fn loopback_available() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Starts a wiremock server, or returns `None` (after logging why) when the
/// sandbox forbids binding sockets.
pub(crate) async fn start_mock_server_or_skip() -> Option<MockServer> {
    if !loopback_available() {
        eprintln!("skipping: cannot bind a loopback socket in this environment");
        return None;
    }
    Some(MockServer::start().await)
}
