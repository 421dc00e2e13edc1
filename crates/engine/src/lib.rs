//! Worldkeeper engine library.
//!
//! Manages the lifecycle of directory-backed game worlds on top of a host
//! server whose live-world registry may only be touched from one thread.
//!
//! ## Structure
//!
//! - `infrastructure/` - Ports, the host thread, directory operations, metadata store
//! - `stores/` - Runtime state (pending confirmations)
//! - `use_cases/` - World lifecycle orchestration
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
