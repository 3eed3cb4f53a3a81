//! Procedural growth of multi-segment plants
//!
//! Generation is a pure function of (origin, parameters, random stream,
//! world accessor): placements are written through the accessor and no
//! state survives the call.

pub mod params;
pub mod segment;
pub mod fern;
pub mod registry;

use crate::core::BlockPos;
use crate::math::random::RandomSource;
use crate::world::WorldAccessor;

pub use params::GrowthParameters;
pub use segment::{SegmentKind, SegmentPlan, sample_height, top_variant_for_height, MAX_STACK_HEIGHT, MIN_STACK_HEIGHT};
pub use fern::{cluster_quantity, find_anchor, FernParts, FernTreeGenerator};
pub use registry::GeneratorRegistry;

/// One committed stack
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedStack {
    /// Position of the lowest segment
    pub base: BlockPos,
    pub plan: SegmentPlan,
}

/// Summary of a growth request. Informational only; the world already holds
/// the result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrowthReport {
    /// Quantity units consumed before finishing or aborting
    pub attempted: u32,
    pub stacks: Vec<PlacedStack>,
}

impl GrowthReport {
    pub fn blocks_planned(&self) -> i32 {
        self.stacks.iter().map(|s| s.plan.height()).sum()
    }
}

/// A plant generator invoked once per growth request.
pub trait TreeGenerator {
    fn grow_tree(
        &self,
        world: &mut dyn WorldAccessor,
        origin: BlockPos,
        params: &GrowthParameters,
        rng: &mut dyn RandomSource,
    ) -> GrowthReport;
}
