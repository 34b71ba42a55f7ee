//! Account change feed.
//!
//! A row-level trigger owned by the provisioning service NOTIFYs a channel
//! on every insert or update of `telegram_accounts`, with a JSON payload
//! `{"op": "insert" | "update", "account_id": "acct_..."}`. This module
//! LISTENs on that channel and hands decoded events to the supervisor.

use copper_relay_accounts::{AccountChange, AccountChangeOp, DirectoryError};
use copper_relay_core::AccountId;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use std::str::FromStr;
use tokio::sync::mpsc;

/// Buffered events between the listener task and the supervisor.
const FEED_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
struct ChangePayload {
    op: String,
    account_id: String,
}

/// Decodes one notification payload.
fn parse_change(payload: &str) -> Result<AccountChange, DirectoryError> {
    let payload: ChangePayload =
        serde_json::from_str(payload).map_err(|e| DirectoryError::InvalidRecord {
            reason: format!("invalid change payload: {e}"),
        })?;

    let op = match payload.op.as_str() {
        "insert" => AccountChangeOp::Insert,
        "update" => AccountChangeOp::Update,
        other => {
            return Err(DirectoryError::InvalidRecord {
                reason: format!("unknown change op '{other}'"),
            });
        }
    };

    let account_id = AccountId::from_str(&payload.account_id).map_err(|e| {
        DirectoryError::InvalidRecord {
            reason: format!("invalid account id '{}': {}", payload.account_id, e),
        }
    })?;

    Ok(AccountChange { op, account_id })
}

/// LISTEN/NOTIFY subscription to account changes.
pub struct AccountChangeFeed {
    pool: PgPool,
    channel: String,
}

impl AccountChangeFeed {
    /// Creates a feed over the given pool and notification channel.
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Subscribes to the channel and returns the event stream.
    ///
    /// Malformed payloads are logged and dropped. The driver reconnects
    /// transient connection losses on its own; if the stream ends for
    /// good, the sender side is dropped and the receiver closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the LISTEN subscription cannot be established.
    pub async fn subscribe(&self) -> Result<mpsc::Receiver<AccountChange>, DirectoryError> {
        let mut listener =
            PgListener::connect_with(&self.pool)
                .await
                .map_err(|e| DirectoryError::QueryFailed {
                    reason: e.to_string(),
                })?;
        listener
            .listen(&self.channel)
            .await
            .map_err(|e| DirectoryError::QueryFailed {
                reason: e.to_string(),
            })?;
        tracing::info!(channel = %self.channel, "listening for account changes");

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let change = match parse_change(notification.payload()) {
                            Ok(change) => change,
                            Err(e) => {
                                tracing::warn!(error = %e, "dropping malformed change event");
                                continue;
                            }
                        };
                        if tx.send(change).await.is_err() {
                            // Supervisor went away; stop listening.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "account change feed failed");
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}
