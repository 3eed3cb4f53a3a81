//! Noise-based seasonal climate model

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::BlockPos;
use super::sampler::ClimateSampler;

/// Parameters controlling the seasonal temperature curve
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateParams {
    pub seed: u32,
    /// Yearly mean temperature at sea level (Celsius)
    pub mean_temperature: f32,
    /// Half the difference between midsummer and midwinter
    pub seasonal_amplitude: f32,
    /// Peak day-to-day deviation from the seasonal curve
    pub daily_variation: f32,
    /// Horizontal scale of weather fronts, in blocks
    pub front_scale: f32,
    /// Days in one in-game year (must match the calendar)
    pub days_per_year: f32,
    /// Height at which no altitude cooling applies
    pub sea_level: i32,
    /// Degrees lost per block above sea level
    pub lapse_rate: f32,
}

impl Default for ClimateParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            mean_temperature: 10.0,
            seasonal_amplitude: 16.0,
            daily_variation: 4.0,
            front_scale: 256.0,
            days_per_year: 108.0,
            sea_level: 110,
            lapse_rate: 0.05,
        }
    }
}

/// Seasonal cosine curve (coldest at the start of the year) plus Perlin
/// weather noise and altitude cooling.
pub struct SeasonalClimate {
    params: ClimateParams,
    noise: Perlin,
}

impl SeasonalClimate {
    pub fn new(params: ClimateParams) -> Self {
        let noise = Perlin::new(params.seed);
        Self { params, noise }
    }

    pub fn params(&self) -> &ClimateParams {
        &self.params
    }

    /// Temperature of the seasonal curve alone, without noise or altitude
    pub fn seasonal_baseline(&self, total_days: f64) -> f32 {
        let year_rel = (total_days / self.params.days_per_year.max(1.0) as f64).fract();
        let phase = (year_rel * std::f64::consts::TAU).cos() as f32;
        self.params.mean_temperature - self.params.seasonal_amplitude * phase
    }
}

impl Default for SeasonalClimate {
    fn default() -> Self {
        Self::new(ClimateParams::default())
    }
}

impl ClimateSampler for SeasonalClimate {
    fn temperature_at(&self, pos: BlockPos, total_days: f64) -> Option<f32> {
        let scale = self.params.front_scale.max(1.0) as f64;
        // Perlin is zero on lattice points; keep whole days off them
        let n = self.noise.get([
            pos.x as f64 / scale,
            pos.z as f64 / scale,
            total_days * 0.37,
        ]) as f32;

        let altitude = (pos.y - self.params.sea_level).max(0) as f32;
        let temp = self.seasonal_baseline(total_days)
            + n * self.params.daily_variation
            - altitude * self.params.lapse_rate;

        temp.is_finite().then_some(temp)
    }
}
