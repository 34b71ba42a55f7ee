//! Account directory seam and change-feed events.

use crate::account::Account;
use crate::error::DirectoryError;
use async_trait::async_trait;
use copper_relay_ai::Persona;
use copper_relay_core::AccountId;
use serde::{Deserialize, Serialize};

/// The kind of row-level event reported by the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountChangeOp {
    /// A new account row was inserted.
    Insert,
    /// An existing account row was updated.
    Update,
}

/// A row-level change event on the account table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChange {
    /// What happened.
    pub op: AccountChangeOp,
    /// Which account it happened to.
    pub account_id: AccountId,
}

/// Trait for account storage the supervisor reads and writes through.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Lists all accounts with the active flag set, each paired with its
    /// persona (first by creation order when multiple exist).
    async fn list_active(&self) -> Result<Vec<(Account, Option<Persona>)>, DirectoryError>;

    /// Finds one account by id.
    async fn find(&self, id: AccountId) -> Result<Option<Account>, DirectoryError>;

    /// Finds the persona for an account (first by creation order).
    async fn find_persona(&self, id: AccountId) -> Result<Option<Persona>, DirectoryError>;

    /// Writes back a connected status and timestamp.
    async fn mark_connected(&self, id: AccountId) -> Result<(), DirectoryError>;

    /// Writes back an error status with the failure message and clears the
    /// active flag so the account is not retried on the next load.
    async fn mark_error(&self, id: AccountId, message: &str) -> Result<(), DirectoryError>;
}
