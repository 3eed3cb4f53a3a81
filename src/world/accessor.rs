//! Block access seam between plant logic and the host world

use glam::IVec3;

use crate::core::BlockPos;
use super::block::BlockId;

/// Storage layer of a block position. Liquids live in their own layer so a
/// submerged plant keeps both its solid block and the water around it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockLayer {
    #[default]
    Solid,
    Fluid,
}

/// Read/write access to world blocks.
///
/// Implemented by the host. Calls never hold state across invocations.
pub trait WorldAccessor {
    /// Block at `pos` in `layer`
    fn block(&self, pos: BlockPos, layer: BlockLayer) -> BlockId;

    /// Block `dy` positions above `pos`
    fn block_above(&self, pos: BlockPos, dy: i32, layer: BlockLayer) -> BlockId {
        self.block(pos + IVec3::new(0, dy, 0), layer)
    }

    /// Write a block. The host picks the layer from the block's kind.
    fn set_block(&mut self, id: BlockId, pos: BlockPos);

    /// Whether `existing` may be overwritten by `candidate`
    fn is_replaceable_by(&self, existing: BlockId, candidate: BlockId) -> bool;

    fn fertility(&self, block: BlockId) -> i32;

    fn is_liquid(&self, block: BlockId) -> bool;
}
