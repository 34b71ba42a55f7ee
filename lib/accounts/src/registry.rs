//! In-memory account registry.
//!
//! Maps each connected account to its open session and persona. Entries
//! live for the process lifetime (or until an explicit deactivation), and
//! the whole map is rebuilt from the store on every startup. The registry
//! is an owned value injected into the router and supervisor; there is no
//! ambient singleton.

use copper_relay_ai::Persona;
use copper_relay_core::{AccountId, UserId};
use copper_relay_messenger::MessengerSession;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// One registered account: its open session and the persona loaded at
/// connect time.
#[derive(Clone)]
pub struct RegisteredAccount {
    /// The open network session.
    pub session: Arc<dyn MessengerSession>,
    /// The persona driving this account's replies.
    pub persona: Persona,
    /// The platform user who owns the account.
    pub owner: UserId,
}

/// Registry of connected accounts.
///
/// Read-mostly after startup; a plain RwLock over a HashMap is all the
/// coordination this needs.
#[derive(Default)]
pub struct AccountRegistry {
    inner: RwLock<HashMap<AccountId, RegisteredAccount>>,
}

impl AccountRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account's session and persona, replacing any previous
    /// entry for the same account.
    pub fn register(
        &self,
        account_id: AccountId,
        session: Arc<dyn MessengerSession>,
        persona: Persona,
        owner: UserId,
    ) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).insert(
            account_id,
            RegisteredAccount {
                session,
                persona,
                owner,
            },
        );
    }

    /// Returns the registered entry for an account, if any.
    #[must_use]
    pub fn get(&self, account_id: AccountId) -> Option<RegisteredAccount> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
    }

    /// Returns true if the account is registered.
    #[must_use]
    pub fn has(&self, account_id: AccountId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&account_id)
    }

    /// Removes and returns an account's entry, if present.
    pub fn remove(&self, account_id: AccountId) -> Option<RegisteredAccount> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&account_id)
    }

    /// Returns the number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
