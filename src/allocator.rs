use std::fmt::{Debug, Formatter};

use rayon::prelude::*;

use crate::color::Rgb;
use crate::color_index::ColorIndex;
use crate::target::TargetImage;

pub const MIN_CANDIDATES: usize = 10;
pub const MAX_CANDIDATES: usize = 50;

/// How many nearest colors to examine before scanning every unclaimed pixel.
pub fn candidate_count(hint: usize, num_targets: usize) -> usize {
    hint.clamp(MIN_CANDIDATES, MAX_CANDIDATES).min(num_targets)
}

/// Which step of `assign` produced the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    /// An unclaimed pixel among the nearest candidates.
    Nearest,
    /// Nearest pixel among all the unclaimed ones.
    Unclaimed,
    /// Everything is claimed; the global nearest is shared.
    Reuse,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AllocatorStats {
    pub nearest: u64,
    pub unclaimed: u64,
    pub reuse: u64,
}

/// Hands out target pixels to brush samples by color.
pub struct Allocator {
    target: TargetImage,
    index: ColorIndex,
    claimed: Vec<bool>,
    num_unclaimed: usize,
    candidates: usize,
    pub stats: AllocatorStats,
}

impl Allocator {
    pub fn new(target: TargetImage, max_candidates: usize) -> Allocator {
        let index = ColorIndex::build(&target.colors);
        let n = target.len();
        Allocator {
            candidates: candidate_count(max_candidates, n),
            index,
            claimed: vec![false; n],
            num_unclaimed: n,
            target,
            stats: AllocatorStats::default(),
        }
    }

    pub fn target(&self) -> &TargetImage {
        &self.target
    }

    #[cfg(test)]
    pub fn is_claimed(&self, index: usize) -> bool {
        self.claimed[index]
    }

    pub fn num_unclaimed(&self) -> usize {
        self.num_unclaimed
    }

    /// Picks the target pixel for a sample painted with `color`.
    /// Returns `None` only when the image has no pixels.
    pub fn assign(&mut self, color: &Rgb) -> Option<usize> {
        self.assign_with_tier(color).map(|(index, _)| index)
    }

    pub fn assign_with_tier(&mut self, color: &Rgb) -> Option<(usize, Tier)> {
        let nearest = self.index.nearest(color, self.candidates);
        let global_nearest = *nearest.first()?;

        if let Some(index) = nearest.into_iter().find(|&i| !self.claimed[i]) {
            self.claim(index);
            self.stats.nearest += 1;
            return Some((index, Tier::Nearest));
        }

        if self.num_unclaimed > 0 {
            if let Some(index) = self.nearest_unclaimed(color) {
                self.claim(index);
                self.stats.unclaimed += 1;
                return Some((index, Tier::Unclaimed));
            }
        }

        self.stats.reuse += 1;
        Some((global_nearest, Tier::Reuse))
    }

    fn claim(&mut self, index: usize) {
        debug_assert!(!self.claimed[index]);
        self.claimed[index] = true;
        self.num_unclaimed -= 1;
    }

    /// Exhaustive scan over the unclaimed pixels. Ties go to the lowest index.
    fn nearest_unclaimed(&self, color: &Rgb) -> Option<usize> {
        let colors = &self.target.colors;
        self.claimed
            .par_iter()
            .enumerate()
            .filter(|(_, claimed)| !**claimed)
            .map(|(i, _)| (color.distance_sq(&colors[i]), i))
            .min()
            .map(|(_, i)| i)
    }
}

impl Debug for Allocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Allocator:")?;
        writeln!(f, "    target: {}x{}", self.target.width, self.target.height)?;
        writeln!(f, "    candidates: {}", self.candidates)?;
        writeln!(f, "    unclaimed: {}", self.num_unclaimed)?;
        writeln!(
            f,
            "    resolved: nearest={} unclaimed={} reuse={}",
            self.stats.nearest, self.stats.unclaimed, self.stats.reuse
        )
    }
}
