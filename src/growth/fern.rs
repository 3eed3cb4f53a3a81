//! Tree fern generator: clusters of short trunk stacks with a foliage crown
//!
//! A growth request samples a cluster quantity, then repeatedly grows one
//! stack, hops the column sideways by a random offset and re-anchors it on
//! fertile, dry ground. Any acceptance failure ends the request early; it
//! is never reported as an error.

use glam::IVec3;

use crate::core::BlockPos;
use crate::math::random::{round_random, RandomSource};
use crate::world::{BlockId, BlockLayer, BlockRegistry, WorldAccessor};
use super::params::GrowthParameters;
use super::segment::{sample_height, SegmentKind, SegmentPlan};
use super::{GrowthReport, PlacedStack, TreeGenerator};

/// Highest vertical offset probed when re-anchoring a spread column
pub const ANCHOR_SCAN_TOP: i32 = 2;
/// Lowest vertical offset probed when re-anchoring a spread column
pub const ANCHOR_SCAN_BOTTOM: i32 = -2;

/// Block ids for each segment kind. `None` parts are skipped on write but
/// still occupy their offset in the stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FernParts {
    pub trunk: Option<BlockId>,
    pub top_young: Option<BlockId>,
    pub top_medium: Option<BlockId>,
    pub top_old: Option<BlockId>,
    pub foliage: Option<BlockId>,
}

impl FernParts {
    /// Resolve `fern-{type}-{part}` codes; missing codes stay `None`.
    pub fn resolve(registry: &BlockRegistry, fern_type: &str) -> Self {
        let part = |name: &str| registry.id(&part_code(fern_type, name));
        Self {
            trunk: part("trunk"),
            top_young: part("trunk-top-young"),
            top_medium: part("trunk-top-medium"),
            top_old: part("trunk-top-old"),
            foliage: part("foliage"),
        }
    }

    pub fn block_for(&self, kind: SegmentKind) -> Option<BlockId> {
        match kind {
            SegmentKind::Trunk => self.trunk,
            SegmentKind::TopYoung => self.top_young,
            SegmentKind::TopMedium => self.top_medium,
            SegmentKind::TopOld => self.top_old,
            SegmentKind::Foliage => self.foliage,
        }
    }
}

/// Block code of one fern part
pub fn part_code(fern_type: &str, part: &str) -> String {
    format!("fern-{}-{}", fern_type, part)
}

/// Sample how many stacks one request tries to grow.
///
/// Zero other-block chance draws from `[1, 3.5)`, otherwise from
/// `[1.5, 5.5)`; the draw is then rounded with [`round_random`].
pub fn cluster_quantity(params: &GrowthParameters, rng: &mut dyn RandomSource) -> i32 {
    let f = if params.other_block_chance == 0.0 {
        1.0 + rng.next_f32() * 2.5
    } else {
        1.5 + rng.next_f32() * 4.0
    };
    round_random(rng, f)
}

/// Find the vertical offset to re-anchor a column on.
///
/// Probes from `ANCHOR_SCAN_TOP` down to `ANCHOR_SCAN_BOTTOM` and accepts the
/// first fertile block whose fluid layer above is dry, so growth favours
/// the top of terrain over depressions.
pub fn find_anchor(world: &dyn WorldAccessor, pos: BlockPos) -> Option<i32> {
    (ANCHOR_SCAN_BOTTOM..=ANCHOR_SCAN_TOP).rev().find(|&dy| {
        let ground = world.block_above(pos, dy, BlockLayer::Solid);
        let fluid = world.block_above(pos, dy + 1, BlockLayer::Fluid);
        world.fertility(ground) > 0 && !world.is_liquid(fluid)
    })
}

/// Generator for one fern type.
#[derive(Clone, Debug)]
pub struct FernTreeGenerator {
    fern_type: String,
    parts: FernParts,
}

impl FernTreeGenerator {
    pub fn new(fern_type: impl Into<String>, parts: FernParts) -> Self {
        Self {
            fern_type: fern_type.into(),
            parts,
        }
    }

    /// Build a generator from the `fern-{type}-*` blocks of a registry
    pub fn from_registry(registry: &BlockRegistry, fern_type: &str) -> Self {
        Self::new(fern_type, FernParts::resolve(registry, fern_type))
    }

    pub fn fern_type(&self) -> &str {
        &self.fern_type
    }

    pub fn parts(&self) -> &FernParts {
        &self.parts
    }

    /// Code the generator registers under (its trunk block)
    pub fn code(&self) -> String {
        part_code(&self.fern_type, "trunk")
    }

    /// Grow a single stack with its lowest segment at `base`.
    ///
    /// Every offset is checked before anything is written; if one planned
    /// block cannot replace what is there the stack is abandoned with no
    /// side effects. Returns the committed plan.
    pub fn grow_one(
        &self,
        world: &mut dyn WorldAccessor,
        base: BlockPos,
        size: f32,
        rng: &mut dyn RandomSource,
    ) -> Option<SegmentPlan> {
        let height = sample_height(size, rng);
        let plan = SegmentPlan::for_height(height);

        for (offset, kind) in plan.iter() {
            let Some(block) = self.parts.block_for(kind) else {
                continue;
            };
            let existing = world.block_above(base, offset, BlockLayer::Solid);
            if !world.is_replaceable_by(existing, block) {
                log::trace!(
                    "Fern stack at {} blocked at offset {} by {:?}",
                    base, offset, existing
                );
                return None;
            }
        }

        for (offset, kind) in plan.iter() {
            if let Some(block) = self.parts.block_for(kind) {
                world.set_block(block, base + IVec3::new(0, offset, 0));
            }
        }

        Some(plan)
    }
}

impl TreeGenerator for FernTreeGenerator {
    fn grow_tree(
        &self,
        world: &mut dyn WorldAccessor,
        origin: BlockPos,
        params: &GrowthParameters,
        rng: &mut dyn RandomSource,
    ) -> GrowthReport {
        let mut report = GrowthReport::default();
        let mut pos = origin;
        let mut quantity = cluster_quantity(params, rng);
        let size = params.effective_size();

        while quantity > 0 {
            quantity -= 1;
            report.attempted += 1;

            let base = pos + IVec3::Y;
            if let Some(plan) = self.grow_one(world, base, size, rng) {
                report.stacks.push(PlacedStack { base, plan });
            }

            // Potentially grow another one nearby
            pos.x += rng.next_int(8) as i32 - 4;
            pos.z += rng.next_int(8) as i32 - 4;

            match find_anchor(world, pos) {
                Some(dy) => pos.y += dy,
                None => {
                    log::trace!("No fertile ground near {}, stopping with {} left", pos, quantity);
                    break;
                }
            }
        }

        log::debug!(
            "Grew {} of {} {} fern stacks at {}",
            report.stacks.len(), report.attempted, self.fern_type, origin
        );
        report
    }
}
