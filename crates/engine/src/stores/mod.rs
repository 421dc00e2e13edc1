//! In-memory state storage modules.
//!
//! Stores manage runtime state that is never persisted:
//! - `ConfirmationStore` - Pending confirmations for destructive world actions

pub mod confirmation;

pub use confirmation::{ConfirmAction, ConfirmationStore, PendingSummary, RequestOutcome};
