//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.

pub mod lifecycle;

pub use lifecycle::{
    CreationResult, LifecycleError, LoadAllSummary, ReconcileReport, WorldLifecycle,
};
