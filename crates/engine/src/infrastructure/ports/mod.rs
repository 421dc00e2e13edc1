//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The host's world registry (only ever touched from the host thread)
//! - Delivering confirmation notices to actors (chat, console, tests)
//! - Clock (for testing)

mod error;
mod host;
mod notifier;
mod testing;

// =============================================================================
// Host Ports
// =============================================================================
pub use error::HostError;
pub use host::WorldRegistry;

// =============================================================================
// Notification Ports
// =============================================================================
pub use notifier::{ActorNotifier, ConfirmationNotice};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use host::MockWorldRegistry;

#[cfg(test)]
pub use notifier::MockActorNotifier;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;
