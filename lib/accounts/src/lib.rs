//! Account registry and supervision for the copper-relay worker.
//!
//! This crate provides:
//!
//! - **Account**: the stored account record and its connection status
//! - **AccountDirectory**: the store seam the supervisor reads and writes
//!   accounts through
//! - **AccountRegistry**: the in-memory map from account id to its open
//!   session and persona
//! - **AccountSupervisor**: startup connection of all active accounts and
//!   the change-feed watch loop

pub mod account;
pub mod directory;
pub mod error;
pub mod registry;
pub mod supervisor;

pub use account::{Account, ConnectionStatus};
pub use directory::{AccountChange, AccountChangeOp, AccountDirectory};
pub use error::{DirectoryError, SupervisorError};
pub use registry::{AccountRegistry, RegisteredAccount};
pub use supervisor::{AccountSupervisor, ConnectOutcome, ConnectSummary};
