//! Texture lookup and tesselation seams
//!
//! Tesselation and atlas packing live in the host renderer. The stage
//! engine only decides which texture path each shape code maps to.

use std::collections::BTreeMap;

use crate::world::{BlockId, CompositeShape};
use super::mesh::Mesh;

/// Inventory icons of crop props resolve every texture code to this prefix
/// plus the plant type.
pub const INVENTORY_TEXTURE_PREFIX: &str = "block/meta/cropprop/";

/// Sub-rectangle of a texture atlas
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AtlasPosition {
    pub page: u32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

/// Host texture atlas
pub trait TextureAtlas {
    /// Atlas dimensions in pixels
    fn size(&self) -> (u32, u32);

    /// Position of `path`, inserting it if missing. `None` if the texture
    /// cannot be loaded.
    fn get_or_insert(&mut self, path: &str) -> Option<AtlasPosition>;
}

/// Texture code resolution handed to the tesselator
pub trait TextureSource {
    fn atlas_size(&self) -> (u32, u32);

    /// Atlas position for a shape texture code
    fn resolve(&mut self, code: &str) -> Option<AtlasPosition>;
}

/// Builds meshes from shapes.
pub trait Tesselator {
    /// The registered default mesh of a block
    fn default_block_mesh(&mut self, block: BlockId) -> Option<Mesh>;

    /// Texture code -> path table declared by a shape asset
    fn shape_textures(&mut self, shape: &CompositeShape) -> Option<BTreeMap<String, String>>;

    fn tesselate(&mut self, shape: &CompositeShape, textures: &mut dyn TextureSource) -> Option<Mesh>;
}

/// Resolves every code to the inventory texture of one plant type.
pub struct InventoryTextures<'a> {
    atlas: &'a mut dyn TextureAtlas,
    path: String,
}

impl<'a> InventoryTextures<'a> {
    pub fn new(atlas: &'a mut dyn TextureAtlas, plant_type: &str) -> Self {
        Self {
            atlas,
            path: inventory_texture_path(plant_type),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl TextureSource for InventoryTextures<'_> {
    fn atlas_size(&self) -> (u32, u32) {
        self.atlas.size()
    }

    fn resolve(&mut self, _code: &str) -> Option<AtlasPosition> {
        self.atlas.get_or_insert(&self.path)
    }
}

pub fn inventory_texture_path(plant_type: &str) -> String {
    format!("{}{}", INVENTORY_TEXTURE_PREFIX, plant_type)
}

/// Resolves codes through variant overrides first, then the shape's own
/// table. Codes found in neither resolve to `None`.
pub struct InstanceTextures<'a> {
    atlas: &'a mut dyn TextureAtlas,
    overrides: Option<&'a BTreeMap<String, String>>,
    shape_textures: &'a BTreeMap<String, String>,
}

impl<'a> InstanceTextures<'a> {
    pub fn new(
        atlas: &'a mut dyn TextureAtlas,
        overrides: Option<&'a BTreeMap<String, String>>,
        shape_textures: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            atlas,
            overrides,
            shape_textures,
        }
    }

    /// Path a code maps to, if any
    pub fn path_for(&self, code: &str) -> Option<&'a str> {
        self.overrides
            .and_then(|o| o.get(code))
            .or_else(|| self.shape_textures.get(code))
            .map(String::as_str)
    }
}

impl TextureSource for InstanceTextures<'_> {
    fn atlas_size(&self) -> (u32, u32) {
        self.atlas.size()
    }

    fn resolve(&mut self, code: &str) -> Option<AtlasPosition> {
        let path = self.path_for(code)?;
        self.atlas.get_or_insert(path)
    }
}
