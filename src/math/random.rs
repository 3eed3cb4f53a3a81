//! Random source abstraction used by the generators

use rand::{Rng, RngCore};

/// Uniform random source consumed by growth generation.
///
/// Any `rand` generator works through the blanket impl; tests can
/// substitute a scripted source to force particular samples.
pub trait RandomSource {
    /// Uniform float in `[0, 1)`
    fn next_f32(&mut self) -> f32;

    /// Uniform integer in `[0, n)`. Returns 0 when `n == 0`.
    fn next_int(&mut self, n: u32) -> u32;
}

impl<R: RngCore> RandomSource for R {
    fn next_f32(&mut self) -> f32 {
        self.random::<f32>()
    }

    fn next_int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.random_range(0..n)
    }
}

/// Round to an integer whose expectation equals `value`.
///
/// The fractional part is the probability of rounding up, so repeated
/// calls average out to the input instead of drifting low like truncation.
pub fn round_random(rng: &mut dyn RandomSource, value: f32) -> i32 {
    let whole = value.floor();
    let frac = value - whole;
    whole as i32 + if rng.next_f32() < frac { 1 } else { 0 }
}

/// Replays fixed samples, then falls back to zeros.
#[cfg(test)]
pub(crate) struct ScriptedRandom {
    floats: std::collections::VecDeque<f32>,
    ints: std::collections::VecDeque<u32>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub(crate) fn new(floats: &[f32], ints: &[u32]) -> Self {
        Self {
            floats: floats.iter().copied().collect(),
            ints: ints.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_f32(&mut self) -> f32 {
        self.floats.pop_front().unwrap_or(0.0)
    }

    fn next_int(&mut self, n: u32) -> u32 {
        self.ints.pop_front().unwrap_or(0).min(n.saturating_sub(1))
    }
}
