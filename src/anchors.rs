//! Candidate placement points ("anchors") for the cargo-bay packer.
//!
//! A pool lives for exactly one packing run. It starts with the origin and
//! grows by up to three points after every successful placement.

use std::cmp::Ordering;

use crate::model::{Dimensions, TruckConfig};
use crate::types::Vec3;

/// Set of unused corners at which the next box may start.
///
/// Never holds two anchors with exactly the same coordinates. Near-duplicates
/// are kept apart on purpose; merging them would change placements.
#[derive(Clone, Debug)]
pub struct AnchorPool {
    points: Vec<Vec3>,
}

impl Default for AnchorPool {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorPool {
    /// Creates the initial pool `{(0, 0, 0)}`.
    pub fn new() -> Self {
        Self {
            points: vec![Vec3::zero()],
        }
    }

    /// Number of anchors currently available.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no anchor is left.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Checks for an anchor with exactly these coordinates.
    pub fn contains(&self, point: &Vec3) -> bool {
        self.points.iter().any(|p| p == point)
    }

    /// Anchors sorted bottom first, then back, then left (`y`, `z`, `x` ascending).
    pub fn ordered(&self) -> Vec<Vec3> {
        let mut sorted = self.points.clone();
        sorted.sort_by(compare_bottom_back_left);
        sorted
    }

    /// Removes an anchor after a box was placed on it.
    pub fn consume(&mut self, point: &Vec3) {
        self.points.retain(|p| p != point);
    }

    /// Adds the successors of a box placed at `point`.
    ///
    /// Each candidate steps past the box along one axis, using the extent the
    /// box has on that axis: `(x + length, y, z)`, `(x, y + width, z)` and
    /// `(x, y, z + height)`. A candidate is dropped if it leaves the truck on
    /// any axis or is already in the pool.
    pub fn propose(&mut self, point: Vec3, dims: &Dimensions, truck: &TruckConfig) {
        let limit = truck.as_vec3();
        let end = point + dims.as_vec3();
        let candidates = [
            Vec3::new(end.x, point.y, point.z),
            Vec3::new(point.x, end.y, point.z),
            Vec3::new(point.x, point.y, end.z),
        ];

        for candidate in candidates {
            if !candidate.fits_within(&limit, 0.0) {
                continue;
            }
            if self.contains(&candidate) {
                continue;
            }
            self.points.push(candidate);
        }
    }
}

/// Orders anchors by `y`, then `z`, then `x`.
fn compare_bottom_back_left(a: &Vec3, b: &Vec3) -> Ordering {
    a.y.partial_cmp(&b.y)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.z.partial_cmp(&b.z).unwrap_or(Ordering::Equal))
        .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
}
