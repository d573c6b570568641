//! Tagged result of a single parse attempt.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Broad category of a decoding failure, mirroring `serde_json::error::Category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailureKind {
    /// The text is not syntactically valid JSON.
    Syntax,
    /// The text ended before a complete value was read (includes empty input).
    Eof,
    /// The text is valid JSON but does not match the requested type.
    Data,
}

/// Diagnostic for text that could not be decoded.
///
/// The message is meant for humans and is not stable across decoder versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseFailure {
    /// Human-readable description, including the position when known.
    pub message: String,
    /// Failure category.
    pub kind: ParseFailureKind,
    /// 1-based line of the failure (0 when unknown).
    pub line: usize,
    /// 1-based column of the failure (0 when unknown).
    pub column: usize,
}

impl ParseFailure {
    pub(crate) fn from_serde(error: &serde_json::Error) -> Self {
        use serde_json::error::Category;

        let kind = match error.classify() {
            Category::Eof => ParseFailureKind::Eof,
            Category::Data => ParseFailureKind::Data,
            // `Io` cannot happen when reading from a `&str`.
            Category::Syntax | Category::Io => ParseFailureKind::Syntax,
        };
        Self {
            message: error.to_string(),
            kind,
            line: error.line(),
            column: error.column(),
        }
    }
}

/// Outcome of decoding a piece of text: either the decoded value or a failure.
///
/// Serializes as `{"ok": true, "data": ...}` or `{"ok": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult<T> {
    /// The text decoded successfully.
    Parsed(T),
    /// The text could not be decoded.
    Failed(ParseFailure),
}

impl<T> ParseResult<T> {
    /// Returns true when decoding succeeded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// Borrows the decoded value, if any.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Parsed(data) => Some(data),
            Self::Failed(_) => None,
        }
    }

    /// Consumes the result and returns the decoded value, if any.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Parsed(data) => Some(data),
            Self::Failed(_) => None,
        }
    }

    /// Borrows the failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ParseFailure> {
        match self {
            Self::Parsed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    /// Converts into a standard `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseFailure`] when decoding failed.
    pub fn into_result(self) -> Result<T, ParseFailure> {
        match self {
            Self::Parsed(data) => Ok(data),
            Self::Failed(failure) => Err(failure),
        }
    }

    /// Maps the decoded value, leaving a failure untouched.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseResult<U> {
        match self {
            Self::Parsed(data) => ParseResult::Parsed(f(data)),
            Self::Failed(failure) => ParseResult::Failed(failure),
        }
    }
}

impl<T> From<ParseResult<T>> for Result<T, ParseFailure> {
    fn from(result: ParseResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: Serialize> Serialize for ParseResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ParseResult", 2)?;
        match self {
            Self::Parsed(data) => {
                state.serialize_field("ok", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failed(failure) => {
                state.serialize_field("ok", &false)?;
                state.serialize_field("error", &failure.message)?;
            }
        }
        state.end()
    }
}
