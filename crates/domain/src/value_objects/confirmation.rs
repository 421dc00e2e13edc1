//! Vocabulary for guarded (confirm-before-run) actions.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who asked for a guarded action.
///
/// Players must confirm explicitly; the console is trusted and its requests run
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ActorId {
    Player(Uuid),
    Console,
}

impl ActorId {
    pub fn is_console(&self) -> bool {
        matches!(self, ActorId::Console)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Player(id) => write!(f, "player:{}", id),
            ActorId::Console => write!(f, "console"),
        }
    }
}

/// The destructive action waiting for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    Delete,
    Rename,
    Unload,
}

impl fmt::Display for ConfirmationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationKind::Delete => write!(f, "delete"),
            ConfirmationKind::Rename => write!(f, "rename"),
            ConfirmationKind::Unload => write!(f, "unload"),
        }
    }
}
