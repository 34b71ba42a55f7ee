//! Error types for the accounts crate.

use copper_relay_core::AccountId;
use std::fmt;

/// Errors from account directory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// A store query failed.
    QueryFailed { reason: String },
    /// A stored row could not be decoded into a domain record.
    InvalidRecord { reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => {
                write!(f, "account directory query failed: {reason}")
            }
            Self::InvalidRecord { reason } => {
                write!(f, "invalid account record: {reason}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from supervisor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// Opening a session for an account failed.
    ConnectFailed { account_id: AccountId, reason: String },
    /// A directory operation failed.
    Directory(DirectoryError),
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { account_id, reason } => {
                write!(f, "failed to connect account {account_id}: {reason}")
            }
            Self::Directory(e) => write!(f, "directory error: {e}"),
        }
    }
}

impl std::error::Error for SupervisorError {}

impl From<DirectoryError> for SupervisorError {
    fn from(e: DirectoryError) -> Self {
        Self::Directory(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_error_display() {
        let err = DirectoryError::QueryFailed {
            reason: "connection reset".to_string(),
        };
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn supervisor_error_display() {
        let id = AccountId::new();
        let err = SupervisorError::ConnectFailed {
            account_id: id,
            reason: "token rejected".to_string(),
        };
        assert!(err.to_string().contains(&id.to_string()));
        assert!(err.to_string().contains("token rejected"));
    }
}
