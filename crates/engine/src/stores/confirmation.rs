//! Pending confirmations for destructive actions.
//!
//! Each actor has at most one pending confirmation. A new request replaces the
//! old one and cancels its expiry timer. Entries leave the table on confirm,
//! cancel, supersede, expiry or shutdown, and every exit cancels the timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use worldkeeper_domain::{ActorId, ConfirmationKind};

use crate::infrastructure::ports::{ActorNotifier, ClockPort, ConfirmationNotice};

/// Deferred action run with the confirming actor.
pub type ConfirmAction = Box<dyn FnOnce(ActorId) + Send + Sync + 'static>;

struct PendingConfirmation {
    /// Distinguishes this entry from a later one for the same actor.
    id: Uuid,
    kind: ConfirmationKind,
    target: String,
    on_confirm: ConfirmAction,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    timer: CancellationToken,
}

/// Read-only view of a pending confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSummary {
    pub kind: ConfirmationKind,
    pub target: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Outcome of [`ConfirmationStore::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Waiting for the actor to confirm.
    Pending,
    /// The actor needs no confirmation; the action already ran.
    RanImmediately,
}

pub struct ConfirmationStore {
    pending: Arc<DashMap<ActorId, PendingConfirmation>>,
    timeout: Duration,
    notifier: Arc<dyn ActorNotifier>,
    clock: Arc<dyn ClockPort>,
}

impl ConfirmationStore {
    pub fn new(
        timeout: Duration,
        notifier: Arc<dyn ActorNotifier>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            timeout,
            notifier,
            clock,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Install a pending confirmation for `actor`, replacing any existing one.
    ///
    /// Console requests are trusted: `on_confirm` runs at once and nothing is
    /// installed. Otherwise an expiry timer starts; if it fires first the entry
    /// is dropped and the actor is told it expired.
    pub async fn request(
        &self,
        actor: ActorId,
        kind: ConfirmationKind,
        target: impl Into<String>,
        on_confirm: ConfirmAction,
    ) -> RequestOutcome {
        let target = target.into();
        if actor.is_console() {
            tracing::debug!(%actor, %kind, subject = %target, "Console request runs without confirmation");
            on_confirm(actor);
            return RequestOutcome::RanImmediately;
        }

        let id = Uuid::new_v4();
        let timer = CancellationToken::new();
        let created_at = self.clock.now();
        let expires_at = chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|timeout| created_at.checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let entry = PendingConfirmation {
            id,
            kind,
            target: target.clone(),
            on_confirm,
            created_at,
            expires_at,
            timer: timer.clone(),
        };
        if let Some(previous) = self.pending.insert(actor, entry) {
            previous.timer.cancel();
            tracing::debug!(%actor, superseded = %previous.kind, "Pending confirmation replaced");
        }

        self.spawn_expiry(actor, id, timer);

        self.notifier
            .notify(
                actor,
                ConfirmationNotice::Requested {
                    kind,
                    target,
                    timeout: self.timeout,
                },
            )
            .await;
        RequestOutcome::Pending
    }

    fn spawn_expiry(&self, actor: ActorId, id: Uuid, timer: CancellationToken) {
        let pending = Arc::clone(&self.pending);
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    // Only drop the entry this timer was started for.
                    let expired = pending.remove_if(&actor, |_, entry| entry.id == id);
                    if let Some((_, entry)) = expired {
                        tracing::debug!(%actor, kind = %entry.kind, "Confirmation expired");
                        notifier
                            .notify(
                                actor,
                                ConfirmationNotice::Expired {
                                    kind: entry.kind,
                                    target: entry.target,
                                },
                            )
                            .await;
                    }
                }
            }
        });
    }

    /// Run the actor's pending action. Returns `false` if nothing was pending.
    pub async fn confirm(&self, actor: ActorId) -> bool {
        let Some((_, entry)) = self.pending.remove(&actor) else {
            self.notifier
                .notify(actor, ConfirmationNotice::NothingPending)
                .await;
            return false;
        };

        entry.timer.cancel();
        tracing::info!(%actor, kind = %entry.kind, subject = %entry.target, "Confirmed");
        (entry.on_confirm)(actor);
        true
    }

    /// Discard the actor's pending action. Returns `false` if nothing was pending.
    pub async fn cancel(&self, actor: ActorId) -> bool {
        let Some((_, entry)) = self.pending.remove(&actor) else {
            self.notifier
                .notify(actor, ConfirmationNotice::NothingPending)
                .await;
            return false;
        };

        entry.timer.cancel();
        self.notifier
            .notify(
                actor,
                ConfirmationNotice::Cancelled {
                    kind: entry.kind,
                    target: entry.target,
                },
            )
            .await;
        true
    }

    pub fn pending(&self, actor: ActorId) -> Option<PendingSummary> {
        self.pending.get(&actor).map(|entry| PendingSummary {
            kind: entry.kind,
            target: entry.target.clone(),
            created_at: entry.created_at,
            expires_at: entry.expires_at,
        })
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Cancel every timer and drop every pending action. Returns how many were
    /// dropped.
    pub fn shutdown(&self) -> usize {
        let actors: Vec<ActorId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut dropped = 0;
        for actor in actors {
            if let Some((_, entry)) = self.pending.remove(&actor) {
                entry.timer.cancel();
                dropped += 1;
            }
        }
        tracing::debug!(dropped, "Confirmation store shut down");
        dropped
    }
}

impl Drop for ConfirmationStore {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.timer.cancel();
        }
    }
}
