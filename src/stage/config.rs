//! Variant configuration for staged plants.
//!
//! A `VariantTable` holds one `VariantConfig` per plant type plus a shared
//! `"dead"` entry. Loaded configs are immutable; resolving a variant for an
//! instance produces a fresh copy with `{type}`/`{stage}` placeholders
//! substituted.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::world::block::{fill_placeholders, CompositeShape};

/// Table key of the variant every dead plant uses
pub const DEAD_VARIANT: &str = "dead";

fn default_true() -> bool {
    true
}

/// Stage window, stage count and optional appearance overrides for one
/// variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    /// Allow the crop block's random rotation for this variant
    #[serde(default = "default_true")]
    pub randomize_rotations: bool,
    /// First month (1-based) of the growth window
    pub month_start: f32,
    /// Month the window ends, exclusive
    pub month_end: f32,
    /// Number of discrete stages across the window
    pub stages: u32,
    /// Shape override; `None` falls back to the crop block's shape
    #[serde(default)]
    pub shape: Option<CompositeShape>,
    /// Texture code -> asset path overrides
    #[serde(default)]
    pub textures: Option<BTreeMap<String, String>>,
}

impl VariantConfig {
    pub fn new(month_start: f32, month_end: f32, stages: u32) -> Self {
        Self {
            randomize_rotations: true,
            month_start,
            month_end,
            stages,
            shape: None,
            textures: None,
        }
    }

    pub fn with_shape(mut self, shape: CompositeShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_texture(mut self, code: impl Into<String>, path: impl Into<String>) -> Self {
        self.textures
            .get_or_insert_with(BTreeMap::new)
            .insert(code.into(), path.into());
        self
    }

    /// Stage count with the `>= 1` floor applied
    pub fn stage_count(&self) -> u32 {
        self.stages.max(1)
    }

    /// Window length as a fraction of the year
    pub fn window_length(&self) -> f32 {
        (self.month_end - self.month_start) / 12.0
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.stages == 0 {
            return Err(Error::Config(format!("variant '{}': stages must be at least 1", key)));
        }
        if !(self.month_end > self.month_start) {
            return Err(Error::Config(format!(
                "variant '{}': month_end {} must be after month_start {}",
                key, self.month_end, self.month_start
            )));
        }
        Ok(())
    }

    /// Copy with `{type}` and `{stage}` filled in shape and texture paths.
    pub fn resolve(&self, plant_type: &str, stage: u32) -> Self {
        let mut resolved = self.clone();
        if let Some(shape) = &self.shape {
            resolved.shape = Some(shape.with_placeholders(plant_type, stage));
        }
        if let Some(textures) = &self.textures {
            resolved.textures = Some(
                textures
                    .iter()
                    .map(|(code, path)| (code.clone(), fill_placeholders(path, plant_type, stage)))
                    .collect(),
            );
        }
        resolved
    }
}

/// All variants of a staged plant block, keyed by type code or `"dead"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantTable {
    types: BTreeMap<String, VariantConfig>,
}

impl VariantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated variant, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, config: VariantConfig) -> Result<Option<VariantConfig>> {
        let key = key.into();
        config.validate(&key)?;
        Ok(self.types.insert(key, config))
    }

    pub fn get(&self, key: &str) -> Option<&VariantConfig> {
        self.types.get(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Plant type codes, excluding the dead variant
    pub fn plant_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str).filter(|k| *k != DEAD_VARIANT)
    }

    /// Key selecting the config for a type/dead pair
    pub fn variant_key(plant_type: &str, dead: bool) -> &str {
        if dead { DEAD_VARIANT } else { plant_type }
    }

    /// Resolve the effective config for an instance.
    pub fn resolve(&self, plant_type: &str, dead: bool, stage: u32) -> Result<VariantConfig> {
        let key = Self::variant_key(plant_type, dead);
        let config = self.types.get(key).ok_or_else(|| Error::UnknownVariant {
            key: key.to_string(),
        })?;
        Ok(config.resolve(plant_type, stage))
    }

    /// Parse `{ "types": { ... } }` and validate every entry
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        for (key, config) in &table.types {
            config.validate(key)?;
        }
        log::debug!("Loaded {} plant variants", table.len());
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a variant table asynchronously
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&data)
    }

    /// Load a variant table (sync)
    pub fn open_sync(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())
            .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&data)
    }

    /// Write the table as JSON (sync)
    pub fn save_sync(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}
