//! Infrastructure implementations.
//!
//! Contains port trait implementations and the filesystem-backed pieces of
//! the engine.

pub mod clock;
pub mod directory;
pub mod host;
pub mod metadata;
pub mod notifier;
pub mod ports;
pub mod settings;
