//! Account records.

use chrono::{DateTime, Utc};
use copper_relay_core::{AccountId, UserId};
use copper_relay_messenger::SessionCredentials;
use serde::{Deserialize, Serialize};

/// Connection status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No session is open.
    Disconnected,
    /// A session is open and serving updates.
    Connected,
    /// The last connection attempt failed; terminal until re-activation.
    Error,
}

impl ConnectionStatus {
    /// Returns the stored string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }

    /// Parses the stored string form, defaulting to disconnected.
    #[must_use]
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "connected" => Self::Connected,
            "error" => Self::Error,
            _ => Self::Disconnected,
        }
    }
}

/// A messaging-network account operated by this worker.
///
/// Accounts are created by an external provisioning flow; this worker
/// reads them and writes back connection outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account id.
    pub id: AccountId,
    /// The platform user who owns this account.
    pub user_id: UserId,
    /// Stored network credentials.
    pub credentials: SessionCredentials,
    /// Whether the supervisor should hold a session open for this account.
    pub is_active: bool,
    /// Current connection status.
    pub connection_status: ConnectionStatus,
    /// Failure message when the status is error.
    pub last_error: Option<String>,
    /// When the current session was opened.
    pub connected_at: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates an active account with the given credentials.
    #[must_use]
    pub fn new(user_id: UserId, credentials: SessionCredentials) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            user_id,
            credentials,
            is_active: true,
            connection_status: ConnectionStatus::Disconnected,
            last_error: None,
            connected_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records a successful connection.
    pub fn mark_connected(&mut self) {
        self.connection_status = ConnectionStatus::Connected;
        self.last_error = None;
        self.connected_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Records a terminal connection failure and deactivates the account
    /// so it is not retried on the next load.
    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.connection_status = ConnectionStatus::Error;
        self.last_error = Some(message.into());
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}
