use crate::config::SpatialIndexMode;
use crate::organism::Organism;
use crate::space::{Position, Torus};
use rstar::{RTree, RTreeObject, AABB};

/// Food searches between trophic tiers. Candidates are passed per call so the
/// caller can kill captured items between queries; dead candidates
/// (`energy <= 0`) are never returned. Distances are minimum-image Euclidean
/// distances on the torus and radii are exclusive.
pub trait SpatialResolver {
    /// Index of the closest live candidate strictly inside `radius`. Ties go
    /// to the lowest index.
    fn nearest_within(&self, candidates: &[Organism], center: Position, radius: f64)
        -> Option<usize>;

    /// Indices of every live candidate strictly inside `radius`, ascending.
    fn capture_all_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Vec<usize>;
}

/// Plain O(n) scan over the candidate slice.
#[derive(Clone, Copy, Debug)]
pub struct LinearScan {
    torus: Torus,
}

impl LinearScan {
    pub fn new(torus: Torus) -> Self {
        Self { torus }
    }
}

impl SpatialResolver for LinearScan {
    fn nearest_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Option<usize> {
        if !(radius > 0.0) {
            return None;
        }
        let r_sq = radius * radius;
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            if !candidate.is_alive() {
                continue;
            }
            let d_sq = self.torus.distance_sq(center, candidate.position);
            if d_sq < r_sq && best.map_or(true, |(_, b)| d_sq < b) {
                best = Some((idx, d_sq));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn capture_all_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Vec<usize> {
        if !(radius > 0.0) {
            return Vec::new();
        }
        let r_sq = radius * radius;
        candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive() && self.torus.distance_sq(center, c.position) < r_sq)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Position-only entry for the R*-tree, pointing back into the candidate slice.
#[derive(Clone, Debug)]
pub struct FoodLocation {
    pub index: usize,
    pub position: Position,
}

impl RTreeObject for FoodLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// R*-tree over the candidates that were alive when the index was built.
/// Positions must not change while the index is in use; liveness may.
pub struct IndexedScan {
    torus: Torus,
    tree: RTree<FoodLocation>,
}

impl IndexedScan {
    /// Bulk-load the live candidates (O(n log n)).
    pub fn build(torus: Torus, candidates: &[Organism]) -> Self {
        let locations: Vec<FoodLocation> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive())
            .map(|(index, c)| FoodLocation {
                index,
                position: c.position,
            })
            .collect();
        Self {
            torus,
            tree: RTree::bulk_load(locations),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Sorted, deduplicated `(index, distance_sq)` of live candidates strictly
    /// inside `radius`, querying one window per wrapped image of the center.
    fn query(&self, candidates: &[Organism], center: Position, radius: f64) -> Vec<(usize, f64)> {
        if !(radius > 0.0) {
            return Vec::new();
        }
        let (x_offsets, x_len) = wrap_offsets(center[0], radius, self.torus.width());
        let (y_offsets, y_len) = wrap_offsets(center[1], radius, self.torus.height());
        let r_sq = radius * radius;
        let mut hits = Vec::new();

        for &xoff in &x_offsets[..x_len] {
            for &yoff in &y_offsets[..y_len] {
                let translated = [center[0] + xoff, center[1] + yoff];
                let envelope = AABB::from_corners(
                    [translated[0] - radius, translated[1] - radius],
                    [translated[0] + radius, translated[1] + radius],
                );
                for loc in self.tree.locate_in_envelope(&envelope) {
                    if !candidates.get(loc.index).is_some_and(Organism::is_alive) {
                        continue;
                    }
                    let d_sq = self.torus.distance_sq(center, loc.position);
                    if d_sq < r_sq {
                        hits.push((loc.index, d_sq));
                    }
                }
            }
        }
        // Wide radii can see the same candidate through several windows.
        hits.sort_unstable_by_key(|&(idx, _)| idx);
        hits.dedup_by_key(|&mut (idx, _)| idx);
        hits
    }
}

impl SpatialResolver for IndexedScan {
    fn nearest_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, d_sq) in self.query(candidates, center, radius) {
            if best.map_or(true, |(_, b)| d_sq < b) {
                best = Some((idx, d_sq));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn capture_all_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Vec<usize> {
        self.query(candidates, center, radius)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Resolver chosen from [`SpatialIndexMode`] for one phase.
pub enum PhaseResolver {
    Linear(LinearScan),
    Indexed(IndexedScan),
}

impl PhaseResolver {
    pub fn build(mode: SpatialIndexMode, torus: Torus, candidates: &[Organism]) -> Self {
        match mode {
            SpatialIndexMode::Linear => PhaseResolver::Linear(LinearScan::new(torus)),
            SpatialIndexMode::RTree => {
                PhaseResolver::Indexed(IndexedScan::build(torus, candidates))
            }
        }
    }
}

impl SpatialResolver for PhaseResolver {
    fn nearest_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Option<usize> {
        match self {
            PhaseResolver::Linear(r) => r.nearest_within(candidates, center, radius),
            PhaseResolver::Indexed(r) => r.nearest_within(candidates, center, radius),
        }
    }

    fn capture_all_within(
        &self,
        candidates: &[Organism],
        center: Position,
        radius: f64,
    ) -> Vec<usize> {
        match self {
            PhaseResolver::Linear(r) => r.capture_all_within(candidates, center, radius),
            PhaseResolver::Indexed(r) => r.capture_all_within(candidates, center, radius),
        }
    }
}

fn wrap_offsets(coord: f64, radius: f64, size: f64) -> ([f64; 3], usize) {
    let mut offsets = [0.0; 3];
    let mut len = 1usize;
    if coord < radius {
        offsets[len] = size;
        len += 1;
    }
    if coord + radius >= size {
        offsets[len] = -size;
        len += 1;
    }
    (offsets, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organism::TrophicTag;
    use proptest::prelude::*;

    fn food(points: &[(f64, f64)]) -> Vec<Organism> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Organism::spawn(i as u64, TrophicTag::Producer, [x, y], 10.0))
            .collect()
    }

    fn both(torus: Torus, candidates: &[Organism]) -> [PhaseResolver; 2] {
        [
            PhaseResolver::build(SpatialIndexMode::Linear, torus, candidates),
            PhaseResolver::build(SpatialIndexMode::RTree, torus, candidates),
        ]
    }

    #[test]
    fn empty_candidates_yield_nothing() {
        let torus = Torus::new(10, 10);
        for resolver in both(torus, &[]) {
            assert_eq!(resolver.nearest_within(&[], [5.0, 5.0], 3.0), None);
            assert!(resolver.capture_all_within(&[], [5.0, 5.0], 3.0).is_empty());
        }
    }

    #[test]
    fn nearest_picks_closest_and_breaks_ties_by_order() {
        let torus = Torus::new(100, 100);
        let candidates = food(&[(10.0, 10.0), (6.0, 5.0), (4.0, 5.0), (5.0, 7.0)]);
        for resolver in both(torus, &candidates) {
            assert_eq!(
                resolver.nearest_within(&candidates, [5.0, 5.0], 10.0),
                Some(1)
            );
        }
    }

    #[test]
    fn radius_is_exclusive() {
        let torus = Torus::new(100, 100);
        let candidates = food(&[(7.0, 5.0)]);
        for resolver in both(torus, &candidates) {
            assert_eq!(resolver.nearest_within(&candidates, [5.0, 5.0], 2.0), None);
            assert!(resolver
                .capture_all_within(&candidates, [5.0, 5.0], 2.0)
                .is_empty());
            assert_eq!(
                resolver.nearest_within(&candidates, [5.0, 5.0], 2.0001),
                Some(0)
            );
        }
    }

    #[test]
    fn dead_candidates_are_invisible() {
        let torus = Torus::new(100, 100);
        let mut candidates = food(&[(5.0, 5.0), (5.5, 5.0)]);
        let resolvers = both(torus, &candidates);
        candidates[0].energy = 0.0;
        for resolver in &resolvers {
            assert_eq!(
                resolver.nearest_within(&candidates, [5.0, 5.0], 2.0),
                Some(1)
            );
            assert_eq!(
                resolver.capture_all_within(&candidates, [5.0, 5.0], 2.0),
                vec![1]
            );
        }
    }

    #[test]
    fn capture_sees_across_corner_seam() {
        let torus = Torus::new(100, 100);
        let candidates = food(&[(99.8, 99.8), (0.4, 0.1), (50.0, 50.0)]);
        for resolver in both(torus, &candidates) {
            assert_eq!(
                resolver.capture_all_within(&candidates, [0.2, 0.2], 1.0),
                vec![0, 1]
            );
        }
    }

    #[test]
    fn wide_radius_reports_each_candidate_once() {
        let torus = Torus::new(10, 10);
        let candidates = food(&[(1.0, 1.0), (9.0, 9.0), (5.0, 5.0)]);
        let resolver = IndexedScan::build(torus, &candidates);
        assert_eq!(resolver.len(), 3);
        assert_eq!(
            resolver.capture_all_within(&candidates, [0.5, 0.5], 20.0),
            vec![0, 1, 2]
        );
    }

    proptest! {
        #[test]
        fn proptest_indexed_scan_matches_linear_scan(
            points in proptest::collection::vec((0.0f64..40.0, 0.0f64..25.0), 0..60),
            cx in 0.0f64..40.0,
            cy in 0.0f64..25.0,
            radius in 0.0f64..30.0,
        ) {
            let torus = Torus::new(40, 25);
            let candidates = food(&points);
            let linear = LinearScan::new(torus);
            let indexed = IndexedScan::build(torus, &candidates);
            prop_assert_eq!(
                linear.capture_all_within(&candidates, [cx, cy], radius),
                indexed.capture_all_within(&candidates, [cx, cy], radius)
            );
            prop_assert_eq!(
                linear.nearest_within(&candidates, [cx, cy], radius),
                indexed.nearest_within(&candidates, [cx, cy], radius)
            );
        }
    }
}
