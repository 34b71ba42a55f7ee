//! Messaging-network client boundary for the copper-relay worker.
//!
//! This crate provides:
//!
//! - **Inbound updates**: the closed set of update shapes the router
//!   operates on, resolved once at the network-client boundary
//! - **Session traits**: open a session from stored credentials, send
//!   text back out
//! - **Telegram implementation**: the teloxide-backed messenger

pub mod error;
pub mod event;
pub mod session;
pub mod telegram;

pub use error::SessionError;
pub use event::{InboundUpdate, SenderProfile};
pub use session::{Messenger, MessengerSession, SessionCredentials, UpdateHandler};
pub use telegram::TelegramMessenger;
