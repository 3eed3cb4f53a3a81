//! Verdure - procedural vegetation growth and crop-prop staging for voxel worlds

pub mod core;
pub mod math;
pub mod world;
pub mod climate;
pub mod growth;
pub mod stage;
