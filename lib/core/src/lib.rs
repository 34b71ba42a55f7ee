//! Core domain types for the copper-relay worker.
//!
//! This crate provides the strongly-typed identifiers shared by every other
//! crate in the workspace, plus the `Result` type alias used at the binary
//! boundary.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{
    AccountId, ConversationId, ParseIdError, PaymentNotificationId, PersonaId, RemoteUserId,
    UserId,
};
