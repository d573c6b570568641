//! Default User-Agent string for outgoing requests.

/// Project URL advertised in the User-Agent (RFC 9308 good citizenship).
const PROJECT_UA_URL: &str = "https://github.com/fierce/safe-fetch";

/// Default User-Agent: crate name, version and project URL.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("safe-fetch/{version} (+{PROJECT_UA_URL})")
}
