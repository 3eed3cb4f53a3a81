//! Segment planning for a single vertical plant stack

use crate::math::random::RandomSource;

/// Shortest stack the generator produces
pub const MIN_STACK_HEIGHT: i32 = 2;
/// Tallest stack the generator produces
pub const MAX_STACK_HEIGHT: i32 = 6;

/// Kind of block occupying one vertical unit of a stack
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Trunk,
    TopYoung,
    TopMedium,
    TopOld,
    Foliage,
}

impl SegmentKind {
    pub fn is_top(self) -> bool {
        matches!(self, Self::TopYoung | Self::TopMedium | Self::TopOld)
    }
}

/// Pick the transitional top segment for a stack of `height`.
///
/// Stacks taller than two get the old top. The `height == 1` young branch
/// is unreachable while `MIN_STACK_HEIGHT` is 2; it is kept so that a lower
/// floor would reproduce the young top rather than silently dropping it.
pub fn top_variant_for_height(height: i32) -> SegmentKind {
    if height > 2 {
        SegmentKind::TopOld
    } else if height == 1 {
        SegmentKind::TopYoung
    } else {
        SegmentKind::TopMedium
    }
}

/// Sample a stack height: `clamp(size * (2 + uniform[0, 6)), 2, 6)`.
pub fn sample_height(size: f32, rng: &mut dyn RandomSource) -> i32 {
    let raw = size.max(0.0) * (2 + rng.next_int(6)) as f32;
    (raw as i32).clamp(MIN_STACK_HEIGHT, MAX_STACK_HEIGHT)
}

/// Ordered (offset, kind) list for one stack, bottom to top.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentPlan {
    segments: Vec<(i32, SegmentKind)>,
}

impl SegmentPlan {
    /// Build the plan for a stack of `height` units.
    ///
    /// Offset `height - 1` is foliage, `height - 2` is the top variant and
    /// every offset below is trunk.
    pub fn for_height(height: i32) -> Self {
        let top = top_variant_for_height(height);
        let segments = (0..height.max(0))
            .map(|i| {
                let kind = if i == height - 2 {
                    top
                } else if i == height - 1 {
                    SegmentKind::Foliage
                } else {
                    SegmentKind::Trunk
                };
                (i, kind)
            })
            .collect();
        Self { segments }
    }

    pub fn height(&self) -> i32 {
        self.segments.len() as i32
    }

    pub fn segments(&self) -> &[(i32, SegmentKind)] {
        &self.segments
    }

    pub fn kind_at(&self, offset: i32) -> Option<SegmentKind> {
        self.segments.iter().find(|(o, _)| *o == offset).map(|(_, k)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, SegmentKind)> + '_ {
        self.segments.iter().copied()
    }
}
