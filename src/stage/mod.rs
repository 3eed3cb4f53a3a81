//! Staged crop props
//!
//! Decorative plants whose growth stage follows the in-game calendar and
//! whose liveness follows local temperature, with a two-threshold band so
//! they do not flicker. Each placed plant is a [`PlantInstance`]; meshes are
//! shared through a [`MeshCache`] keyed by crop block, liveness and
//! position-hashed alternate.

pub mod config;
pub mod schedule;
pub mod mesh;
pub mod texture;
pub mod instance;
pub mod prop_block;
pub mod field;

pub use config::{VariantConfig, VariantTable, DEAD_VARIANT};
pub use schedule::{evaluate_vitality, target_stage, VitalityChange, DEATH_TEMPERATURE, REVIVAL_TEMPERATURE};
pub use mesh::{select_variant, Mesh, MeshCache, MeshHandle, MeshKey, SharedMeshCache, CROP_MESH_OFFSET, UNKNOWN_VARIANT};
pub use texture::{AtlasPosition, InstanceTextures, InventoryTextures, Tesselator, TextureAtlas, TextureSource};
pub use instance::{crop_block_code, load_instance, MeshEnv, PlantInstance, PlantInstanceState, StageEnv, TickOutcome};
pub use prop_block::CropPropBlock;
pub use field::{FieldTickSummary, PlantField};
