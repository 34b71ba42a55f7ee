//! Postgres persistence for the copper-relay worker.
//!
//! This crate provides:
//!
//! - **PgAccountDirectory**: accounts and personas, with connect-outcome
//!   writebacks
//! - **PgConversationStore**: conversation rows, in-place counters, and
//!   payment notifications
//! - **AccountChangeFeed**: the LISTEN/NOTIFY subscription driving live
//!   account changes
//!
//! The schema (tables and the notify trigger on `telegram_accounts`) is
//! owned by the external provisioning service; this worker only reads and
//! writes rows and runs no migrations.

pub mod account;
pub mod conversation;
pub mod listener;

pub use account::PgAccountDirectory;
pub use conversation::PgConversationStore;
pub use listener::AccountChangeFeed;
