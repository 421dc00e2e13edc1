//! Notification sink for actors with pending confirmations.

use std::time::Duration;

use async_trait::async_trait;
use worldkeeper_domain::{ActorId, ConfirmationKind};

/// What happened to an actor's guarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationNotice {
    /// A confirmation is now pending and will expire after `timeout`.
    Requested {
        kind: ConfirmationKind,
        target: String,
        timeout: Duration,
    },
    /// The pending confirmation timed out without being confirmed.
    Expired {
        kind: ConfirmationKind,
        target: String,
    },
    /// The actor cancelled the pending confirmation.
    Cancelled {
        kind: ConfirmationKind,
        target: String,
    },
    /// Confirm or cancel was issued with nothing pending.
    NothingPending,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorNotifier: Send + Sync {
    async fn notify(&self, actor: ActorId, notice: ConfirmationNotice);
}
