//! Worldkeeper domain types.
//!
//! Pure value types shared by the engine: validated world names, the persisted
//! world configuration, host-reported world handles, confirmation vocabulary
//! and the built-in terrain generators. Nothing here touches the filesystem or
//! the host.

extern crate self as worldkeeper_domain;

pub mod entities;
pub mod error;
pub mod generation;
pub mod value_objects;

pub use entities::{WorldConfig, WorldHandle};
pub use error::DomainError;
pub use generation::{
    Block, BlockPlacement, ChunkGenerator, FlatGenerator, SpawnPoint, VoidGenerator,
};
pub use value_objects::{
    ActorId, ConfirmationKind, Environment, GeneratorKind, WorldName, WorldType,
};
