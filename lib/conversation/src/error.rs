//! Error types for the conversation crate.

use copper_relay_core::AccountId;
use copper_relay_messenger::SessionError;
use std::fmt;

/// Errors from conversation storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A store query failed.
    QueryFailed { reason: String },
    /// A stored row could not be decoded into a domain record.
    InvalidRecord { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueryFailed { reason } => {
                write!(f, "conversation store query failed: {reason}")
            }
            Self::InvalidRecord { reason } => {
                write!(f, "invalid conversation record: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors from routing one inbound update.
///
/// Returned to the session handler, which logs the error and drops the
/// event; nothing here halts processing of subsequent messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The update arrived for an account the registry does not hold.
    AccountNotRegistered { account_id: AccountId },
    /// A store operation failed.
    Store(StoreError),
    /// An outbound send failed.
    Send(SessionError),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountNotRegistered { account_id } => {
                write!(f, "account not registered: {account_id}")
            }
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Send(e) => write!(f, "send error: {e}"),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<StoreError> for RouterError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SessionError> for RouterError {
    fn from(e: SessionError) -> Self {
        Self::Send(e)
    }
}
