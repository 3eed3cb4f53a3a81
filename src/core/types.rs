//! Core type aliases and re-exports

pub use glam::{IVec3, Vec2, Vec3};

/// Integer block position in world space
pub type BlockPos = IVec3;

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;
