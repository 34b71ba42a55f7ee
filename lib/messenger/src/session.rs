//! Session traits and credential types.
//!
//! All network access goes through these traits, providing a uniform
//! interface for the supervisor and router and allowing tests to run
//! without a live network.

use crate::error::SessionError;
use crate::event::InboundUpdate;
use async_trait::async_trait;
use copper_relay_core::{AccountId, RemoteUserId};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stored network credentials for one account.
///
/// The session token is an opaque blob persisted by the operator's
/// provisioning flow; this worker never generates or inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCredentials {
    /// Application id issued by the network.
    pub api_id: i32,
    /// Application hash issued by the network.
    pub api_hash: String,
    /// Opaque session token authorizing this account.
    pub session_token: String,
}

/// Callback invoked for every inbound update on a session.
///
/// The handler owns error isolation: it must not panic, and a failure for
/// one update must not affect the session or other accounts.
pub type UpdateHandler =
    Arc<dyn Fn(AccountId, InboundUpdate) -> BoxFuture<'static, ()> + Send + Sync>;

/// An open, authenticated connection for one account.
#[async_trait]
pub trait MessengerSession: Send + Sync {
    /// Sends a text message to a remote user.
    ///
    /// # Errors
    ///
    /// Returns an error if the network rejects or fails the send. The
    /// caller decides whether to log and drop; no retry happens here.
    async fn send_text(&self, user: RemoteUserId, text: &str) -> Result<(), SessionError>;

    /// Closes the session, stopping inbound update delivery.
    ///
    /// Idempotent; closing an already-closed session is a no-op.
    async fn close(&self);
}

/// Trait for opening sessions from stored credentials.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Opens a session for an account and installs its update handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the connection
    /// cannot be established within the configured retry count.
    async fn open_session(
        &self,
        account_id: AccountId,
        credentials: &SessionCredentials,
        handler: UpdateHandler,
    ) -> Result<Arc<dyn MessengerSession>, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_serde_roundtrip() {
        let credentials = SessionCredentials {
            api_id: 12345,
            api_hash: "abcdef".to_string(),
            session_token: "1BQANOTREAL".to_string(),
        };
        let json = serde_json::to_string(&credentials).expect("serialize");
        let parsed: SessionCredentials = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(credentials, parsed);
    }
}
