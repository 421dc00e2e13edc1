//! Validated world name newtype
//!
//! A world name is also the name of the world's directory inside the host's
//! world container, so it must always be a single, portable path component:
//! - Non-empty after trimming
//! - At most 64 characters
//! - Only ASCII letters, digits, `_`, `-` and `.`
//! - Not starting with `.` (rules out `.`, `..` and hidden directories)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for world names
const MAX_WORLD_NAME_LENGTH: usize = 64;

// ============================================================================
// WorldName
// ============================================================================

/// A validated world name (non-empty, <=64 chars, trimmed, directory-safe)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorldName(String);

impl WorldName {
    /// Create a new validated world name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 64 characters after trimming
    /// - The name contains a character other than ASCII alphanumerics, `_`, `-`, `.`
    /// - The name starts with `.`
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("World name cannot be empty"));
        }
        if trimmed.len() > MAX_WORLD_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "World name cannot exceed {} characters",
                MAX_WORLD_NAME_LENGTH
            )));
        }
        if trimmed.starts_with('.') {
            return Err(DomainError::validation(format!(
                "World name cannot start with '.': {}",
                trimmed
            )));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(DomainError::validation(format!(
                "World name contains invalid character {:?}: {}",
                bad, trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorldName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for WorldName {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<WorldName> for String {
    fn from(name: WorldName) -> String {
        name.0
    }
}
