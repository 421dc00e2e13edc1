//! Enumerated world settings: dimension, level type and generation strategy.
//!
//! The string forms match the host's on-disk and configuration vocabulary
//! (`NORMAL`, `NETHER`, `THE_END`, ...), so they round-trip through the
//! metadata document unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// ============================================================================
// Environment
// ============================================================================

/// Which dimension a world simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    /// Overworld
    #[default]
    Normal,
    Nether,
    TheEnd,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Normal => write!(f, "NORMAL"),
            Environment::Nether => write!(f, "NETHER"),
            Environment::TheEnd => write!(f, "THE_END"),
        }
    }
}

impl FromStr for Environment {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" | "OVERWORLD" => Ok(Environment::Normal),
            "NETHER" => Ok(Environment::Nether),
            "THE_END" | "END" => Ok(Environment::TheEnd),
            _ => Err(DomainError::parse(format!("Unknown environment: {}", s))),
        }
    }
}

// ============================================================================
// World Type
// ============================================================================

/// The host's level type used by vanilla terrain generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorldType {
    #[default]
    Normal,
    Flat,
    LargeBiomes,
    Amplified,
}

impl fmt::Display for WorldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldType::Normal => write!(f, "NORMAL"),
            WorldType::Flat => write!(f, "FLAT"),
            WorldType::LargeBiomes => write!(f, "LARGE_BIOMES"),
            WorldType::Amplified => write!(f, "AMPLIFIED"),
        }
    }
}

impl FromStr for WorldType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(WorldType::Normal),
            "FLAT" => Ok(WorldType::Flat),
            "LARGE_BIOMES" | "LARGEBIOMES" => Ok(WorldType::LargeBiomes),
            "AMPLIFIED" => Ok(WorldType::Amplified),
            _ => Err(DomainError::parse(format!("Unknown world type: {}", s))),
        }
    }
}

// ============================================================================
// Generator Kind
// ============================================================================

/// Selects the terrain generation strategy for a world.
///
/// `Normal` leaves generation to the host; `Flat` and `Void` plug in the
/// lightweight generators from [`crate::generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeneratorKind {
    #[default]
    #[serde(alias = "DEFAULT")]
    Normal,
    Flat,
    Void,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorKind::Normal => write!(f, "NORMAL"),
            GeneratorKind::Flat => write!(f, "FLAT"),
            GeneratorKind::Void => write!(f, "VOID"),
        }
    }
}

impl FromStr for GeneratorKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" | "DEFAULT" => Ok(GeneratorKind::Normal),
            "FLAT" => Ok(GeneratorKind::Flat),
            "VOID" => Ok(GeneratorKind::Void),
            _ => Err(DomainError::parse(format!("Unknown generator kind: {}", s))),
        }
    }
}
