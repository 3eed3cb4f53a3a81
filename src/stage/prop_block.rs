//! The crop prop block type: inventory meshes and display names

use crate::world::{BlockId, CompositeShape};

use super::instance::PlantInstance;
use super::mesh::{Mesh, MeshHandle, SharedMeshCache};
use super::texture::{InventoryTextures, Tesselator, TextureAtlas};

/// Type used when an item stack carries no plant type
pub const UNKNOWN_TYPE: &str = "unknown";

/// Block-level behavior shared by every crop prop instance.
///
/// Owns the per-type inventory mesh cache; call [`CropPropBlock::unload`]
/// when the block type is torn down.
#[derive(Debug)]
pub struct CropPropBlock {
    id: BlockId,
    code: String,
    shape: CompositeShape,
    inventory_meshes: SharedMeshCache<String>,
}

impl CropPropBlock {
    pub fn new(id: BlockId, code: impl Into<String>, shape: CompositeShape) -> Self {
        Self {
            id,
            code: code.into(),
            shape,
            inventory_meshes: SharedMeshCache::new(),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Inventory mesh for a plant type, built once per type.
    pub fn inventory_mesh(
        &mut self,
        plant_type: Option<&str>,
        tesselator: &mut dyn Tesselator,
        atlas: &mut dyn TextureAtlas,
    ) -> Option<MeshHandle> {
        let plant_type = plant_type.unwrap_or(UNKNOWN_TYPE);
        let shape = &self.shape;
        self.inventory_meshes.get_or_build(plant_type.to_string(), || {
            log::debug!("Building inventory mesh for crop prop '{}'", plant_type);
            build_inventory_mesh(shape, plant_type, tesselator, atlas)
        })
    }

    pub fn cached_inventory_meshes(&self) -> usize {
        self.inventory_meshes.len()
    }

    /// Release every cached inventory mesh. Returns the count released.
    pub fn unload(&mut self) -> usize {
        let released = self.inventory_meshes.clear();
        if released > 0 {
            log::debug!("Released {} crop prop inventory meshes", released);
        }
        released
    }

    /// Name key of a placed instance, falling back to the block's own code
    pub fn placed_name_key(&self, instance: Option<&PlantInstance>) -> String {
        instance
            .and_then(PlantInstance::placed_name_key)
            .unwrap_or_else(|| format!("block-{}", self.code))
    }

    /// Name key describing a held item's plant type
    pub fn held_item_info_key(plant_type: Option<&str>) -> String {
        format!("cropprop-type-{}", plant_type.unwrap_or(UNKNOWN_TYPE))
    }
}

fn build_inventory_mesh(
    shape: &CompositeShape,
    plant_type: &str,
    tesselator: &mut dyn Tesselator,
    atlas: &mut dyn TextureAtlas,
) -> Option<Mesh> {
    let mut textures = InventoryTextures::new(atlas, plant_type);
    tesselator.tesselate(shape, &mut textures)
}
