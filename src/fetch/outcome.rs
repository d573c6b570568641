//! Terminal outcomes and lifecycle states of a request.

use std::fmt;

use bytes::Bytes;

use super::error::FetchFailure;
use super::progress::ProgressEvent;

/// How a request ended. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<P> {
    /// The transfer finished. For GET requests any status counts, including
    /// 4xx and 5xx; downloads only complete on 2xx.
    Completed { status: u16, payload: P },
    /// The deadline passed before the request settled.
    TimedOut,
    /// The caller cancelled the request.
    Cancelled,
    /// The transport failed.
    NetworkError { message: String },
    /// The server answered with a non-2xx status (downloads only).
    HttpError { status: u16 },
}

/// Outcome of a timed GET: the status and a prefix of the body text.
pub type TextOutcome = Outcome<String>;

/// Outcome of a download: the status and the full body.
pub type DownloadOutcome = Outcome<Bytes>;

impl<P> Outcome<P> {
    /// Returns the lifecycle state this outcome settles into.
    #[must_use]
    pub fn state(&self) -> RequestState {
        match self {
            Self::Completed { .. } => RequestState::Completed,
            Self::TimedOut => RequestState::TimedOut,
            Self::Cancelled => RequestState::Cancelled,
            Self::NetworkError { .. } => RequestState::NetworkError,
            Self::HttpError { .. } => RequestState::HttpError,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns the HTTP status, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Completed { status, .. } | Self::HttpError { status } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn payload(&self) -> Option<&P> {
        match self {
            Self::Completed { payload, .. } => Some(payload),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> Option<P> {
        match self {
            Self::Completed { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Describes a non-completed outcome as a [`FetchFailure`].
    #[must_use]
    pub fn failure(&self) -> Option<FetchFailure> {
        match self {
            Self::Completed { .. } => None,
            Self::TimedOut => Some(FetchFailure::TimedOut),
            Self::Cancelled => Some(FetchFailure::Cancelled),
            Self::NetworkError { message } => Some(FetchFailure::NetworkError {
                message: message.clone(),
            }),
            Self::HttpError { status } => Some(FetchFailure::HttpError { status: *status }),
        }
    }

    /// Converts into a `Result`, keeping the status alongside the payload.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchFailure`] for every non-completed outcome.
    pub fn into_result(self) -> Result<(u16, P), FetchFailure> {
        match self {
            Self::Completed { status, payload } => Ok((status, payload)),
            Self::TimedOut => Err(FetchFailure::TimedOut),
            Self::Cancelled => Err(FetchFailure::Cancelled),
            Self::NetworkError { message } => Err(FetchFailure::NetworkError { message }),
            Self::HttpError { status } => Err(FetchFailure::HttpError { status }),
        }
    }
}

impl fmt::Display for TextOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { status, payload } => {
                write!(f, "Completed: {status}\n{payload}...")
            }
            Self::TimedOut => f.write_str("Timed out"),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::NetworkError { message } => write!(f, "Network error: {message}"),
            Self::HttpError { status } => write!(f, "HTTP error: {status}"),
        }
    }
}

/// Lifecycle state of a request, as observed through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    InFlight,
    Completed,
    TimedOut,
    Cancelled,
    NetworkError,
    HttpError,
}

impl RequestState {
    /// Returns true for every state except `InFlight`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InFlight)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InFlight => "in_flight",
            Self::Completed => "completed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
            Self::NetworkError => "network_error",
            Self::HttpError => "http_error",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item on a request's event channel.
///
/// Progress events arrive in order with non-decreasing `loaded_bytes`; the
/// single `Finished` event is always last.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent<P> {
    Progress(ProgressEvent),
    Finished(Outcome<P>),
}
