//! Error types for the messenger crate.

use std::fmt;

/// Errors from messaging-network session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The stored credentials were rejected by the network.
    InvalidCredentials { reason: String },
    /// Opening the session failed after exhausting the retry count.
    ConnectFailed { attempts: u32, reason: String },
    /// Sending a message failed.
    SendFailed { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials { reason } => {
                write!(f, "credentials rejected: {reason}")
            }
            Self::ConnectFailed { attempts, reason } => {
                write!(f, "session open failed after {attempts} attempts: {reason}")
            }
            Self::SendFailed { reason } => {
                write!(f, "send failed: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}
