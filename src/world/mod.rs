//! World access: block registry, accessor seam, persisted attributes

pub mod block;
pub mod accessor;
pub mod attributes;
pub mod voxel_world;

pub use block::{BlockDef, BlockId, BlockRegistry, CompositeShape, RotationAxes};
pub use accessor::{BlockLayer, WorldAccessor};
pub use attributes::{AttributeTree, AttributeValue};
pub use voxel_world::VoxelWorld;
