//! Lightweight terrain generators for `Flat` and `Void` worlds.
//!
//! These are deterministic: the output depends only on the chunk coordinates,
//! never on the seed. Vanilla generation (`GeneratorKind::Normal`) stays with
//! the host and has no generator here.

use serde::{Deserialize, Serialize};

use crate::value_objects::GeneratorKind;

/// Blocks the built-in generators place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Block {
    Bedrock,
    Dirt,
    GrassBlock,
}

/// One block placed at chunk-local `x`/`z` and absolute `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlacement {
    pub x: u8,
    pub y: i32,
    pub z: u8,
    pub block: Block,
}

/// A position players are sent to when they enter a world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SpawnPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Default for SpawnPoint {
    /// Centre of chunk (0, 0) at sea level.
    fn default() -> Self {
        Self::new(0.5, 64.0, 0.5)
    }
}

/// Chunk generator contract shared by the built-in generators.
pub trait ChunkGenerator: Send + Sync {
    /// Blocks for the 16x16 chunk at `(chunk_x, chunk_z)`.
    fn generate_chunk(&self, chunk_x: i32, chunk_z: i32) -> Vec<BlockPlacement>;

    /// A spawn position fixed by the generator, if it has one.
    fn fixed_spawn(&self) -> Option<SpawnPoint> {
        None
    }

    /// Spawn position for a world using this generator.
    ///
    /// Falls back to standing on the highest block of chunk (0, 0).
    fn spawn_point(&self) -> SpawnPoint {
        if let Some(spawn) = self.fixed_spawn() {
            return spawn;
        }
        self.generate_chunk(0, 0)
            .iter()
            .filter(|b| b.x == 0 && b.z == 0)
            .map(|b| b.y)
            .max()
            .map(|top| SpawnPoint::new(0.5, f64::from(top + 1), 0.5))
            .unwrap_or_default()
    }
}

/// Bedrock floor, two layers of dirt and a grass surface, in every chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGenerator;

impl ChunkGenerator for FlatGenerator {
    fn generate_chunk(&self, _chunk_x: i32, _chunk_z: i32) -> Vec<BlockPlacement> {
        const LAYERS: [(i32, Block); 4] = [
            (0, Block::Bedrock),
            (1, Block::Dirt),
            (2, Block::Dirt),
            (3, Block::GrassBlock),
        ];

        let mut blocks = Vec::with_capacity(16 * 16 * LAYERS.len());
        for x in 0..16u8 {
            for z in 0..16u8 {
                for (y, block) in LAYERS {
                    blocks.push(BlockPlacement { x, y, z, block });
                }
            }
        }
        blocks
    }
}

/// Empty world with a 5x5 bedrock platform at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidGenerator;

const VOID_PLATFORM_Y: i32 = 64;

impl ChunkGenerator for VoidGenerator {
    fn generate_chunk(&self, chunk_x: i32, chunk_z: i32) -> Vec<BlockPlacement> {
        if chunk_x != 0 || chunk_z != 0 {
            return Vec::new();
        }
        let mut blocks = Vec::with_capacity(25);
        for x in 0..5u8 {
            for z in 0..5u8 {
                blocks.push(BlockPlacement {
                    x,
                    y: VOID_PLATFORM_Y,
                    z,
                    block: Block::Bedrock,
                });
            }
        }
        blocks
    }

    fn fixed_spawn(&self) -> Option<SpawnPoint> {
        Some(SpawnPoint::new(2.5, f64::from(VOID_PLATFORM_Y + 1), 2.5))
    }
}

impl GeneratorKind {
    /// The built-in generator for this kind; `None` means host generation.
    pub fn chunk_generator(self) -> Option<Box<dyn ChunkGenerator>> {
        match self {
            GeneratorKind::Normal => None,
            GeneratorKind::Flat => Some(Box::new(FlatGenerator)),
            GeneratorKind::Void => Some(Box::new(VoidGenerator)),
        }
    }
}
