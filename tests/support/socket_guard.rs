//! Skip network-backed tests where loopback sockets are not permitted.

use wiremock::MockServer;

/// Returns true when a loopback TCP listener can be bound.
pub fn loopback_available() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Starts a wiremock server, or returns `None` (after logging why) when the
/// sandbox forbids binding sockets.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if !loopback_available() {
        eprintln!("skipping: cannot bind a loopback socket in this environment");
        return None;
    }
    Some(MockServer::start().await)
}

/// An `http://127.0.0.1:PORT/` URL nothing is listening on, or `None` when
/// loopback sockets are unavailable.
pub fn refused_url() -> Option<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").ok()?;
    let addr = listener.local_addr().ok()?;
    drop(listener);
    Some(format!("http://{addr}/"))
}
