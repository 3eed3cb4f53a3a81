//! Calendar-driven stage selection and temperature hysteresis.
//!
//! Both functions are pure; `PlantInstance::tick` feeds them the calendar and
//! climate observations.

use super::config::VariantConfig;

/// Living plants die below this temperature (°C)
pub const DEATH_TEMPERATURE: f32 = -2.0;
/// Dead plants revive above this temperature (°C)
pub const REVIVAL_TEMPERATURE: f32 = 15.0;

/// Stage a plant should show at `year_rel` (fraction of the year, `[0, 1)`).
///
/// Stages spread evenly over `[month_start, month_end)`; before the window
/// the result saturates at 1 and after it at `stages`.
pub fn target_stage(year_rel: f32, config: &VariantConfig) -> u32 {
    let stages = config.stage_count();
    let window_start = (config.month_start - 1.0) / 12.0;
    let raw = ((year_rel - window_start) / config.window_length() * stages as f32).floor();
    if raw.is_nan() {
        return 1;
    }
    raw.clamp(1.0, stages as f32) as u32
}

/// Liveness transition produced by one temperature observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VitalityChange {
    pub died: bool,
    pub revived: bool,
}

impl VitalityChange {
    pub fn any(self) -> bool {
        self.died || self.revived
    }

    /// Dead flag after applying this change
    pub fn apply(self, dead: bool) -> bool {
        if self.died {
            true
        } else if self.revived {
            false
        } else {
            dead
        }
    }
}

/// Compare a temperature against the hysteresis band. Between the two
/// thresholds the current state is kept.
pub fn evaluate_vitality(dead: bool, temperature: f32) -> VitalityChange {
    VitalityChange {
        died: !dead && temperature < DEATH_TEMPERATURE,
        revived: dead && temperature > REVIVAL_TEMPERATURE,
    }
}
