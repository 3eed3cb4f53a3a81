//! Climate sampling seam

use crate::core::BlockPos;

/// Local climate queries used by the stage engine.
pub trait ClimateSampler {
    /// Air temperature in degrees Celsius at `pos` on the given day.
    ///
    /// `None` means no observation is available this cycle; callers treat it
    /// as "skip" rather than as an error.
    fn temperature_at(&self, pos: BlockPos, total_days: f64) -> Option<f32>;
}

impl<F> ClimateSampler for F
where
    F: Fn(BlockPos, f64) -> Option<f32>,
{
    fn temperature_at(&self, pos: BlockPos, total_days: f64) -> Option<f32> {
        self(pos, total_days)
    }
}
