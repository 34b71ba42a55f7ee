//! Error types for the AI crate.

use std::fmt;

/// Errors from chat-completion operations.
///
/// Every variant means the same thing to the router: no reply this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The HTTP request could not be sent or completed.
    RequestFailed { reason: String },
    /// The endpoint answered with a non-success status.
    BadStatus { status: u16 },
    /// The response body did not have the expected shape.
    MalformedResponse { reason: String },
    /// Invalid backend configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "generation request failed: {reason}")
            }
            Self::BadStatus { status } => {
                write!(f, "generation endpoint returned status {status}")
            }
            Self::MalformedResponse { reason } => {
                write!(f, "malformed generation response: {reason}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid generation configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for GenerationError {}
