//! Domain entities.
//!
//! - `WorldConfig` - declarative, persisted per-world configuration
//! - `WorldHandle` - runtime snapshot of a live world reported by the host

mod world_config;
mod world_handle;

pub use world_config::WorldConfig;
pub use world_handle::WorldHandle;
