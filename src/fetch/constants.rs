//! Constants for the fetch module (timeouts, body prefix length).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default overall timeout for a timed GET (3 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3_000;

/// Upper bound for any configured timeout (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3_600;

/// Number of characters of a GET body reported in `Outcome::Completed`.
pub const DEFAULT_BODY_PREFIX_CHARS: usize = 200;

/// Upper bound for the configured body prefix length.
pub const MAX_BODY_PREFIX_CHARS: usize = 1_048_576;

/// Cap on up-front buffer allocation for downloads with a declared length.
///
/// Larger payloads still download; the buffer just grows as chunks arrive.
pub(crate) const MAX_PREALLOCATED_BYTES: u64 = 16 * 1024 * 1024;
