//! In-memory world backed by sparse block maps

use std::collections::HashMap;

use crate::core::BlockPos;
use super::accessor::{BlockLayer, WorldAccessor};
use super::block::{BlockId, BlockRegistry};

/// Sparse voxel world over a block registry.
///
/// Positions never written read back as air. Used by the demo binary,
/// the benches and the tests; real hosts implement [`WorldAccessor`] over
/// their own chunk storage.
#[derive(Clone, Debug)]
pub struct VoxelWorld {
    registry: BlockRegistry,
    solid: HashMap<BlockPos, BlockId>,
    fluid: HashMap<BlockPos, BlockId>,
    /// Positions written since the last `take_modified`
    modified: Vec<BlockPos>,
}

impl VoxelWorld {
    /// Create an empty world over the given registry
    pub fn new(registry: BlockRegistry) -> Self {
        Self {
            registry,
            solid: HashMap::new(),
            fluid: HashMap::new(),
            modified: Vec::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Fill `[min.x, max.x] x [min.z, max.z]` at height `y` with `id`.
    pub fn fill_layer(&mut self, min: BlockPos, max: BlockPos, y: i32, id: BlockId) {
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                self.set_block(id, BlockPos::new(x, y, z));
            }
        }
    }

    /// Clear both layers at a position
    pub fn clear(&mut self, pos: BlockPos) {
        let had_solid = self.solid.remove(&pos).is_some();
        let had_fluid = self.fluid.remove(&pos).is_some();
        if had_solid || had_fluid {
            self.mark_modified(pos);
        }
    }

    /// Number of non-air positions across both layers
    pub fn block_count(&self) -> usize {
        self.solid.len() + self.fluid.len()
    }

    /// Take the list of written positions and clear the internal list
    pub fn take_modified(&mut self) -> Vec<BlockPos> {
        std::mem::take(&mut self.modified)
    }

    fn mark_modified(&mut self, pos: BlockPos) {
        if !self.modified.contains(&pos) {
            self.modified.push(pos);
        }
    }

    fn layer_map(&self, layer: BlockLayer) -> &HashMap<BlockPos, BlockId> {
        match layer {
            BlockLayer::Solid => &self.solid,
            BlockLayer::Fluid => &self.fluid,
        }
    }
}

impl WorldAccessor for VoxelWorld {
    fn block(&self, pos: BlockPos, layer: BlockLayer) -> BlockId {
        self.layer_map(layer).get(&pos).copied().unwrap_or(BlockId::AIR)
    }

    fn set_block(&mut self, id: BlockId, pos: BlockPos) {
        let map = if self.registry.is_liquid(id) {
            &mut self.fluid
        } else {
            &mut self.solid
        };
        if id == BlockId::AIR {
            map.remove(&pos);
        } else {
            map.insert(pos, id);
        }
        self.mark_modified(pos);
    }

    fn is_replaceable_by(&self, existing: BlockId, candidate: BlockId) -> bool {
        self.registry.is_replaceable_by(existing, candidate)
    }

    fn fertility(&self, block: BlockId) -> i32 {
        self.registry.fertility(block)
    }

    fn is_liquid(&self, block: BlockId) -> bool {
        self.registry.is_liquid(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::block::BlockDef;

    fn world() -> (VoxelWorld, BlockId, BlockId) {
        let mut r = BlockRegistry::new();
        let soil = r.register(BlockDef::new("soil").with_fertility(50)).unwrap();
        let water = r.register(BlockDef::new("water").liquid().with_replaceable(9500)).unwrap();
        (VoxelWorld::new(r), soil, water)
    }

    #[test]
    fn test_unset_reads_air() {
        let (w, _, _) = world();
        assert_eq!(w.block(BlockPos::new(3, 4, 5), BlockLayer::Solid), BlockId::AIR);
        assert_eq!(w.block(BlockPos::new(3, 4, 5), BlockLayer::Fluid), BlockId::AIR);
    }

    #[test]
    fn test_liquids_go_to_fluid_layer() {
        let (mut w, soil, water) = world();
        let p = BlockPos::new(0, 10, 0);
        w.set_block(soil, p);
        w.set_block(water, p);
        assert_eq!(w.block(p, BlockLayer::Solid), soil);
        assert_eq!(w.block(p, BlockLayer::Fluid), water);
        assert_eq!(w.block_count(), 2);
    }

    #[test]
    fn test_block_above() {
        let (mut w, soil, _) = world();
        w.set_block(soil, BlockPos::new(1, 5, 1));
        assert_eq!(w.block_above(BlockPos::new(1, 3, 1), 2, BlockLayer::Solid), soil);
        assert_eq!(w.block_above(BlockPos::new(1, 7, 1), -2, BlockLayer::Solid), soil);
    }

    #[test]
    fn test_fill_and_modified() {
        let (mut w, soil, _) = world();
        w.fill_layer(BlockPos::new(-1, 0, -1), BlockPos::new(1, 0, 1), 0, soil);
        assert_eq!(w.block_count(), 9);
        let modified = w.take_modified();
        assert_eq!(modified.len(), 9);
        assert!(w.take_modified().is_empty());
    }

    #[test]
    fn test_set_air_removes() {
        let (mut w, soil, _) = world();
        let p = BlockPos::new(2, 2, 2);
        w.set_block(soil, p);
        w.set_block(BlockId::AIR, p);
        assert_eq!(w.block_count(), 0);
        w.set_block(soil, p);
        w.clear(p);
        assert_eq!(w.block(p, BlockLayer::Solid), BlockId::AIR);
    }
}
