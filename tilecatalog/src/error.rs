//! Error types shared across the catalog read client.

use std::fmt;

/// Classifies a failed catalog operation.
///
/// The code is the stable, matchable part of an [`ApiError`]; the message
/// carries human-readable detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Request carried an unusable argument (e.g. an empty prefetch list).
    InvalidArgument,
    /// Request combined incompatible or missing selectors.
    PreconditionFailed,
    /// Backend rejected the request (HTTP 4xx other than 404).
    BadRequest,
    /// Blob or partition absent at the origin.
    NotFound,
    /// The operation's cancellation token fired.
    Cancelled,
    /// Parse failure or a bulk operation with zero successes.
    Unknown,
    /// Transport-level failure, with HTTP status if one was received.
    Network,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::PreconditionFailed => "PreconditionFailed",
            Self::BadRequest => "BadRequest",
            Self::NotFound => "NotFound",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
            Self::Network => "Network",
        };
        f.write_str(name)
    }
}

/// Error returned by catalog read operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    http_status: Option<u16>,
}

impl ApiError {
    /// Creates an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
        }
    }

    /// Attaches the HTTP status the backend answered with.
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Shorthand for a cancellation error.
    pub fn cancelled() -> Self {
        Self::new(ErrorCode::Cancelled, "Cancelled")
    }

    /// Shorthand for an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    /// Shorthand for a precondition failure.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PreconditionFailed, message)
    }

    /// Shorthand for a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Shorthand for a transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    /// Error used whenever a backend response fails to decode.
    pub fn parse_failure() -> Self {
        Self::new(ErrorCode::Unknown, "Fail parsing response.")
    }

    /// Maps a non-success HTTP status to the matching error kind.
    ///
    /// 404 becomes [`ErrorCode::NotFound`], other 4xx become
    /// [`ErrorCode::BadRequest`], everything else is a transport failure.
    pub fn from_status(status: u16, url: &str) -> Self {
        let code = match status {
            404 => ErrorCode::NotFound,
            400..=499 => ErrorCode::BadRequest,
            _ => ErrorCode::Network,
        };
        Self::new(code, format!("HTTP {} from {}", status, url)).with_status(status)
    }

    /// Returns the error classification.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the backend answered at all.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Returns true if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::Cancelled
    }
}
