//! Notifier that writes confirmation notices to the log.
//!
//! Used by the binary, where no chat or console transport is attached.

use async_trait::async_trait;
use worldkeeper_domain::ActorId;

use crate::infrastructure::ports::{ActorNotifier, ConfirmationNotice};

#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl ActorNotifier for LoggingNotifier {
    async fn notify(&self, actor: ActorId, notice: ConfirmationNotice) {
        match notice {
            ConfirmationNotice::Requested {
                kind,
                target,
                timeout,
            } => tracing::info!(
                %actor,
                %kind,
                subject = %target,
                timeout_secs = timeout.as_secs(),
                "Confirmation required"
            ),
            ConfirmationNotice::Expired { kind, target } => {
                tracing::info!(%actor, %kind, subject = %target, "Confirmation expired")
            }
            ConfirmationNotice::Cancelled { kind, target } => {
                tracing::info!(%actor, %kind, subject = %target, "Confirmation cancelled")
            }
            ConfirmationNotice::NothingPending => {
                tracing::info!(%actor, "No pending confirmation")
            }
        }
    }
}
