//! Conversation routing for the copper-relay worker.
//!
//! This crate provides:
//!
//! - **Conversation**: the per-(account, remote user) state record and its
//!   status machine
//! - **ConversationStore**: the persistence seam the router writes through
//! - **ConversationRouter**: the per-message decision logic dispatching to
//!   the new-user, payment-screenshot, and regular-message paths

pub mod conversation;
pub mod error;
pub mod router;
pub mod store;

pub use conversation::{
    Conversation, ConversationStatus, PaymentNotification, PaymentNotificationStatus,
};
pub use error::{RouterError, StoreError};
pub use router::{ConversationRouter, RouteOutcome};
pub use store::ConversationStore;
