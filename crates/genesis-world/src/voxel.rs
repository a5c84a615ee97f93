//! In-memory voxel engine.
//!
//! Holds the shared block world behind a `RwLock`, enforcing the one
//! block per integer coordinate invariant. Placement conflicts are
//! rejections, not panics -- callers record them and continue.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use genesis_types::{EntityId, Material, Vec3, VoxelBlock};

use crate::error::WorldError;

/// The shared voxel world.
///
/// All mutation is serialized through the inner lock; the engine never
/// blocks a tick for long since operations are map inserts and lookups.
#[derive(Debug, Default)]
pub struct VoxelEngine {
    blocks: RwLock<BTreeMap<(i64, i64, i64), VoxelBlock>>,
}

impl VoxelEngine {
    /// Create an empty voxel world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a block at an integer coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::BlockOccupied`] when a block already exists
    /// at the coordinate. The world is unchanged in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn place_block(
        &self,
        x: i64,
        y: i64,
        z: i64,
        color: &str,
        material: Material,
        placed_by: EntityId,
        tick: u64,
    ) -> Result<VoxelBlock, WorldError> {
        let mut blocks = self
            .blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if blocks.contains_key(&(x, y, z)) {
            return Err(WorldError::BlockOccupied { x, y, z });
        }
        let block = VoxelBlock {
            x,
            y,
            z,
            color: color.to_owned(),
            material,
            placed_by,
            placed_tick: tick,
        };
        blocks.insert((x, y, z), block.clone());
        Ok(block)
    }

    /// Remove the block at a coordinate. Returns whether one existed.
    pub fn destroy_block(&self, x: i64, y: i64, z: i64) -> bool {
        self.blocks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(x, y, z))
            .is_some()
    }

    /// Whether a solid (wall) block occupies the coordinate.
    ///
    /// Glass and emissive blocks do not occlude vision or sound.
    pub fn is_solid(&self, x: i64, y: i64, z: i64) -> bool {
        self.blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(x, y, z))
            .is_some_and(|b| b.material == Material::Solid)
    }

    /// Total number of blocks in the world.
    pub fn count_blocks(&self) -> usize {
        self.blocks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Blocks within `radius` of a center point, for perception and
    /// destroy-target selection.
    pub fn blocks_near(&self, center: Vec3, radius: f64) -> Vec<VoxelBlock> {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        blocks
            .values()
            .filter(|b| {
                let pos = Vec3::new(b.x as f64, b.y as f64, b.z as f64);
                pos.distance(center) <= radius
            })
            .cloned()
            .collect()
    }
}
