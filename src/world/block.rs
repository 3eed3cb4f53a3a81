//! Block definitions and the code <-> id registry.
//!
//! `BlockId` is a thin index into `BlockRegistry`. Id 0 is always air.
//! The registry is data-driven: hosts load it from JSON and plant code
//! resolves its parts by code (`fern-{type}-trunk`, `crop-{type}-{stage}`).

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Replaceable rank at or above which a block may be overwritten by growth
pub const REPLACEABLE_THRESHOLD: u32 = 6000;

/// Index into the block registry. 0 = air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    pub const AIR: Self = Self(0);
}

/// Axes a crop block randomizes its rotation over
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxes {
    #[default]
    Y,
    Xyz,
}

/// Reference to a shape asset plus its alternates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeShape {
    /// Asset path of the primary shape
    pub base: String,
    /// Alternate shape paths; together with `base` they form the baked set
    #[serde(default)]
    pub alternates: Vec<String>,
}

impl CompositeShape {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            alternates: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternates = alternates.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_alternates(&self) -> bool {
        !self.alternates.is_empty()
    }

    /// The base shape followed by every alternate, each as a plain shape.
    /// `None` when there are no alternates to choose from.
    pub fn baked_alternates(&self) -> Option<Vec<CompositeShape>> {
        if self.alternates.is_empty() {
            return None;
        }
        let mut baked = Vec::with_capacity(self.alternates.len() + 1);
        baked.push(CompositeShape::new(self.base.clone()));
        baked.extend(self.alternates.iter().map(|p| CompositeShape::new(p.clone())));
        Some(baked)
    }

    /// Substitute `{stage}` and `{type}` placeholders in every path.
    pub fn with_placeholders(&self, plant_type: &str, stage: u32) -> Self {
        Self {
            base: fill_placeholders(&self.base, plant_type, stage),
            alternates: self
                .alternates
                .iter()
                .map(|p| fill_placeholders(p, plant_type, stage))
                .collect(),
        }
    }
}

/// Replace `{stage}` and `{type}` in an asset path.
pub fn fill_placeholders(path: &str, plant_type: &str, stage: u32) -> String {
    path.replace("{stage}", &stage.to_string())
        .replace("{type}", plant_type)
}

/// Definition of a single block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub code: String,
    /// Soil fertility; growth only anchors on blocks with fertility > 0
    #[serde(default)]
    pub fertility: i32,
    /// Replaceable rank (air = 9999, solid terrain = 0)
    #[serde(default)]
    pub replaceable: u32,
    #[serde(default)]
    pub liquid: bool,
    #[serde(default)]
    pub shape: Option<CompositeShape>,
    #[serde(default)]
    pub randomize_rotations: bool,
    #[serde(default)]
    pub random_rotation_axes: RotationAxes,
}

impl BlockDef {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            fertility: 0,
            replaceable: 0,
            liquid: false,
            shape: None,
            randomize_rotations: false,
            random_rotation_axes: RotationAxes::Y,
        }
    }

    pub fn air() -> Self {
        Self {
            replaceable: 9999,
            ..Self::new("air")
        }
    }

    pub fn with_fertility(mut self, fertility: i32) -> Self {
        self.fertility = fertility;
        self
    }

    pub fn with_replaceable(mut self, replaceable: u32) -> Self {
        self.replaceable = replaceable;
        self
    }

    pub fn liquid(mut self) -> Self {
        self.liquid = true;
        self
    }

    pub fn with_shape(mut self, shape: CompositeShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_random_rotations(mut self, axes: RotationAxes) -> Self {
        self.randomize_rotations = true;
        self.random_rotation_axes = axes;
        self
    }

    /// Whether growth of `candidate` may overwrite this block.
    pub fn is_replaceable_by(&self, candidate: &BlockDef) -> bool {
        self.replaceable >= REPLACEABLE_THRESHOLD && candidate.replaceable < self.replaceable
    }
}

/// On-disk form of the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RegistryFile {
    blocks: Vec<BlockDef>,
}

/// Table of block definitions.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    blocks: Vec<BlockDef>,
    by_code: HashMap<String, BlockId>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Registry containing only air.
    pub fn new() -> Self {
        let mut by_code = HashMap::new();
        by_code.insert("air".to_string(), BlockId::AIR);
        Self {
            blocks: vec![BlockDef::air()],
            by_code,
        }
    }

    /// Add a block and return its id. Codes must be unique.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockId> {
        if self.by_code.contains_key(&def.code) {
            return Err(Error::Config(format!("duplicate block code '{}'", def.code)));
        }
        let id = BlockId(self.blocks.len() as u32);
        self.by_code.insert(def.code.clone(), id);
        self.blocks.push(def);
        Ok(id)
    }

    /// Number of blocks including air.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: BlockId) -> Option<&BlockDef> {
        self.blocks.get(id.0 as usize)
    }

    pub fn id(&self, code: &str) -> Option<BlockId> {
        self.by_code.get(code).copied()
    }

    /// Like [`Self::id`] but an unknown code is an error.
    pub fn require(&self, code: &str) -> Result<BlockId> {
        self.id(code).ok_or_else(|| Error::UnknownBlock(code.to_string()))
    }

    /// Unknown ids behave like solid, infertile, non-replaceable terrain.
    pub fn is_replaceable_by(&self, existing: BlockId, candidate: BlockId) -> bool {
        match (self.get(existing), self.get(candidate)) {
            (Some(e), Some(c)) => e.is_replaceable_by(c),
            _ => false,
        }
    }

    pub fn fertility(&self, id: BlockId) -> i32 {
        self.get(id).map(|b| b.fertility).unwrap_or(0)
    }

    pub fn is_liquid(&self, id: BlockId) -> bool {
        self.get(id).is_some_and(|b| b.liquid)
    }

    /// Parse `{ "blocks": [...] }`. Air is implicit and must not be listed.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for def in file.blocks {
            registry.register(def)?;
        }
        log::debug!("Loaded {} block definitions", registry.len());
        Ok(registry)
    }

    /// Load a registry file asynchronously
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&data)
    }

    /// Load a registry file (sync)
    pub fn open_sync(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&data)
    }

    /// Serialize every block except the implicit air entry.
    pub fn to_json(&self) -> Result<String> {
        let file = RegistryFile {
            blocks: self.blocks[1..].to_vec(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}
