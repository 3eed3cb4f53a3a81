//! Caller-supplied growth parameters

use serde::{Deserialize, Serialize};

/// Parameters for one growth request.
///
/// The random stream is passed alongside rather than stored here so the
/// same parameters can drive many requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParameters {
    /// Height multiplier; negative values behave as 0
    pub size: f32,
    /// Chance that world generation substitutes another block nearby.
    /// Zero selects the tighter cluster-quantity range.
    pub other_block_chance: f32,
    /// Chance of vine growth. Carried for generator implementations that
    /// grow vines; the fern generator ignores it.
    pub vines_growth_chance: f32,
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            size: 1.0,
            other_block_chance: 0.0,
            vines_growth_chance: 0.0,
        }
    }
}

impl GrowthParameters {
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_other_block_chance(mut self, chance: f32) -> Self {
        self.other_block_chance = chance;
        self
    }

    pub fn with_vines_growth_chance(mut self, chance: f32) -> Self {
        self.vines_growth_chance = chance;
        self
    }

    /// Size with the non-negative invariant applied
    pub fn effective_size(&self) -> f32 {
        self.size.max(0.0)
    }
}
