//! Account supervision.
//!
//! On startup the supervisor connects every active account; afterwards it
//! applies change-feed events so accounts added or toggled after startup
//! become live (or go dark) without a restart. A failure for one account
//! never aborts processing of the others.

use crate::account::Account;
use crate::directory::{AccountChange, AccountDirectory};
use crate::error::SupervisorError;
use crate::registry::AccountRegistry;
use copper_relay_ai::Persona;
use copper_relay_messenger::{Messenger, UpdateHandler};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A session was opened and registered.
    Connected,
    /// The account was already in the registry; nothing was done.
    AlreadyRegistered,
}

/// Tally of a startup load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectSummary {
    /// Accounts connected and registered.
    pub connected: usize,
    /// Accounts whose session open failed (marked error, deactivated).
    pub failed: usize,
    /// Accounts skipped: already registered, or missing a persona.
    pub skipped: usize,
}

/// Supervises account sessions against the directory and registry.
pub struct AccountSupervisor<D, M> {
    directory: D,
    messenger: M,
    registry: Arc<AccountRegistry>,
    handler: UpdateHandler,
}

impl<D: AccountDirectory, M: Messenger> AccountSupervisor<D, M> {
    /// Creates a supervisor.
    ///
    /// The handler is installed on every session the supervisor opens.
    pub fn new(
        directory: D,
        messenger: M,
        registry: Arc<AccountRegistry>,
        handler: UpdateHandler,
    ) -> Self {
        Self {
            directory,
            messenger,
            registry,
            handler,
        }
    }

    /// Connects every active account from the directory.
    ///
    /// Per-account failures are logged and tallied; they do not stop the
    /// loop. Accounts without a persona are skipped with a warning, since
    /// nothing could be sent on their behalf.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory query itself fails.
    pub async fn load_active_accounts(&self) -> Result<ConnectSummary, SupervisorError> {
        let accounts = self.directory.list_active().await?;
        tracing::info!(count = accounts.len(), "loading active accounts");

        let mut summary = ConnectSummary::default();
        for (account, persona) in accounts {
            let Some(persona) = persona else {
                tracing::warn!(account_id = %account.id, "account has no persona, skipping");
                summary.skipped += 1;
                continue;
            };
            match self.connect_account(&account, persona).await {
                Ok(ConnectOutcome::Connected) => summary.connected += 1,
                Ok(ConnectOutcome::AlreadyRegistered) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!(account_id = %account.id, error = %e, "account connect failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            connected = summary.connected,
            failed = summary.failed,
            skipped = summary.skipped,
            "startup account load finished"
        );
        Ok(summary)
    }

    /// Opens a session for one account and registers it.
    ///
    /// Idempotent by registry membership: an already-registered account is
    /// left untouched. On open failure the account is marked error and
    /// deactivated in the directory; that outcome is terminal until
    /// external re-activation.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be opened.
    pub async fn connect_account(
        &self,
        account: &Account,
        persona: Persona,
    ) -> Result<ConnectOutcome, SupervisorError> {
        if self.registry.has(account.id) {
            tracing::debug!(account_id = %account.id, "account already registered");
            return Ok(ConnectOutcome::AlreadyRegistered);
        }

        match self
            .messenger
            .open_session(account.id, &account.credentials, self.handler.clone())
            .await
        {
            Ok(session) => {
                if let Err(e) = self.directory.mark_connected(account.id).await {
                    tracing::warn!(
                        account_id = %account.id,
                        error = %e,
                        "failed to record connected status"
                    );
                }
                self.registry
                    .register(account.id, session, persona, account.user_id);
                Ok(ConnectOutcome::Connected)
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(store_err) = self.directory.mark_error(account.id, &reason).await {
                    tracing::warn!(
                        account_id = %account.id,
                        error = %store_err,
                        "failed to record error status"
                    );
                }
                Err(SupervisorError::ConnectFailed {
                    account_id: account.id,
                    reason,
                })
            }
        }
    }

    /// Applies one change-feed event.
    ///
    /// A newly-active account is connected; a deactivated account's
    /// session is closed and its registry entry removed; everything else
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory lookup or the connect attempt
    /// fails.
    pub async fn handle_change(&self, change: AccountChange) -> Result<(), SupervisorError> {
        let Some(account) = self.directory.find(change.account_id).await? else {
            tracing::warn!(account_id = %change.account_id, "change event for unknown account");
            return Ok(());
        };

        if !account.is_active {
            if let Some(entry) = self.registry.remove(account.id) {
                entry.session.close().await;
                tracing::info!(account_id = %account.id, "account deactivated, session closed");
            }
            return Ok(());
        }

        if self.registry.has(account.id) {
            return Ok(());
        }

        let Some(persona) = self.directory.find_persona(account.id).await? else {
            tracing::warn!(account_id = %account.id, "active account has no persona, skipping");
            return Ok(());
        };

        if self.connect_account(&account, persona).await? == ConnectOutcome::Connected {
            tracing::info!(account_id = %account.id, "account connected from change event");
        }
        Ok(())
    }

    /// Consumes the change feed until it ends.
    ///
    /// Event failures are logged and dropped; the loop keeps serving
    /// subsequent events. When the feed itself ends, already-connected
    /// accounts keep running.
    pub async fn watch_account_changes(&self, mut feed: mpsc::Receiver<AccountChange>) {
        while let Some(change) = feed.recv().await {
            tracing::debug!(
                account_id = %change.account_id,
                op = ?change.op,
                "account change event"
            );
            if let Err(e) = self.handle_change(change).await {
                tracing::error!(
                    account_id = %change.account_id,
                    error = %e,
                    "failed to apply account change"
                );
            }
        }
        tracing::error!("account change feed ended");
    }
}
