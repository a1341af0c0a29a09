use std::collections::BinaryHeap;

use rayon::prelude::*;

use crate::color::Rgb;

const AXES: usize = 3;

/// Static k-d tree over the distinct target colors, for nearest-color lookups.
///
/// Each distinct color is one tree node and owns the ascending list of pixels painted
/// with it, so a flat background costs one node no matter how many pixels it covers.
/// The tree is implicit: `order` is a permutation of the color ids where the median of
/// every sub-range is that sub-tree's split node, splitting on R, G, B in turn.
pub struct ColorIndex {
    colors: Vec<Rgb>,
    /// Pixels of color `c` are `members[starts[c]..starts[c + 1]]`.
    starts: Vec<u32>,
    members: Vec<u32>,
    order: Vec<u32>,
}

/// Running state of one k-nearest query.
struct Search<'a> {
    query: &'a Rgb,
    k: usize,
    /// Colors that may still hold a top-k pixel, worst (farthest) on top.
    best: BinaryHeap<(u32, u32)>,
    /// Pixels covered by `best`.
    pixels: usize,
    visited: usize,
}

impl ColorIndex {
    pub fn build(colors: &[Rgb]) -> ColorIndex {
        let mut members: Vec<u32> = (0..colors.len() as u32).collect();
        members.par_sort_unstable_by_key(|&i| (colors[i as usize].0, i));

        let mut unique: Vec<Rgb> = Vec::new();
        let mut starts: Vec<u32> = Vec::new();
        for (pos, &pixel) in members.iter().enumerate() {
            let color = colors[pixel as usize];
            if unique.last() != Some(&color) {
                unique.push(color);
                starts.push(pos as u32);
            }
        }
        starts.push(members.len() as u32);

        let mut order: Vec<u32> = (0..unique.len() as u32).collect();
        split(&unique, &mut order, 0);
        ColorIndex {
            colors: unique,
            starts,
            members,
            order,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Number of distinct colors, i.e. tree nodes.
    #[cfg(test)]
    pub fn num_colors(&self) -> usize {
        self.colors.len()
    }

    /// Returns up to `k` target indices nearest to `color`, closest first.
    /// Equal distances are ordered by target index.
    pub fn nearest(&self, color: &Rgb, k: usize) -> Vec<usize> {
        self.nearest_visiting(color, k).0
    }

    /// `nearest`, plus how many tree nodes the query touched.
    pub fn nearest_visiting(&self, color: &Rgb, k: usize) -> (Vec<usize>, usize) {
        if k == 0 || self.is_empty() {
            return (Vec::new(), 0);
        }
        let mut search = Search {
            query: color,
            k,
            best: BinaryHeap::new(),
            pixels: 0,
            visited: 0,
        };
        self.search(0, self.order.len(), 0, &mut search);
        (self.collect(search.best.into_sorted_vec(), k), search.visited)
    }

    fn pixels_of(&self, color: u32) -> &[u32] {
        let c = color as usize;
        &self.members[self.starts[c] as usize..self.starts[c + 1] as usize]
    }

    fn search(&self, lo: usize, hi: usize, depth: usize, s: &mut Search) {
        if lo >= hi {
            return;
        }
        s.visited += 1;
        let mid = lo + (hi - lo) / 2;
        let id = self.order[mid];
        let node = &self.colors[id as usize];

        let dist = s.query.distance_sq(node);
        let full = s.pixels >= s.k;
        if !full || s.best.peek().is_some_and(|worst| dist <= worst.0) {
            s.best.push((dist, id));
            s.pixels += self.pixels_of(id).len();
            self.shed_farthest(s);
        }

        let axis = depth % AXES;
        let diff = s.query.channel(axis) as i32 - node.channel(axis) as i32;
        let (near, far) = if diff < 0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, s);

        // Only cross the split plane if the far side could still hold a closer (or tied) color.
        let plane = (diff * diff) as u32;
        if s.pixels < s.k || s.best.peek().is_some_and(|worst| plane <= worst.0) {
            self.search(far.0, far.1, depth + 1, s);
        }
    }

    /// Drops the farthest distance band while the closer colors alone cover `k` pixels.
    fn shed_farthest(&self, s: &mut Search) {
        while let Some(&(worst, _)) = s.best.peek() {
            let banded: usize = s
                .best
                .iter()
                .filter(|(dist, _)| *dist == worst)
                .map(|(_, id)| self.pixels_of(*id).len())
                .sum();
            if s.pixels - banded < s.k {
                return;
            }
            while s.best.peek().is_some_and(|(dist, _)| *dist == worst) {
                if let Some((_, id)) = s.best.pop() {
                    s.pixels -= self.pixels_of(id).len();
                }
            }
        }
    }

    /// Expands the chosen colors into pixel indices, merging each distance band by index.
    fn collect(&self, sorted: Vec<(u32, u32)>, k: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(k);
        for band in sorted.chunk_by(|a, b| a.0 == b.0) {
            let mut pixels: Vec<u32> = band
                .iter()
                .flat_map(|(_, id)| self.pixels_of(*id).iter().take(k - out.len()).copied())
                .collect();
            pixels.sort_unstable();
            out.extend(pixels.into_iter().take(k - out.len()).map(|i| i as usize));
            if out.len() >= k {
                break;
            }
        }
        out
    }
}

fn split(colors: &[Rgb], order: &mut [u32], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % AXES;
    let mid = order.len() / 2;
    order.select_nth_unstable_by_key(mid, |&i| (colors[i as usize].channel(axis), i));
    let (left, right) = order.split_at_mut(mid);
    split(colors, left, depth + 1);
    split(colors, &mut right[1..], depth + 1);
}
