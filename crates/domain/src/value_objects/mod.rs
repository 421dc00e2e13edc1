//! Value objects - Immutable objects defined by their attributes

mod confirmation;
mod names;
mod world_settings;

pub use confirmation::{ActorId, ConfirmationKind};
pub use names::WorldName;
pub use world_settings::{Environment, GeneratorKind, WorldType};
