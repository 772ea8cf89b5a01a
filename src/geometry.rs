//! Geometric helpers for collision detection inside the cargo bay.
//!
//! Both tests work on raw `(position, extent)` pairs so the packer can probe
//! a candidate box before anything is allocated for it.

use crate::types::Vec3;

/// Checks whether two axis-aligned boxes overlap with positive volume.
///
/// Two boxes do NOT intersect if they are separated on at least one axis.
/// The comparisons are strict, so boxes sharing a face are not overlapping.
///
/// # Examples
/// ```
/// use truck_packer::geometry::intersects;
/// use truck_packer::types::Vec3;
///
/// let cube = Vec3::new(1.2, 1.2, 1.2);
/// assert!(!intersects(Vec3::zero(), cube, Vec3::new(1.2, 0.0, 0.0), cube));
/// assert!(intersects(Vec3::zero(), cube, Vec3::new(0.6, 0.6, 0.6), cube));
/// ```
pub fn intersects(pos_a: Vec3, dims_a: Vec3, pos_b: Vec3, dims_b: Vec3) -> bool {
    pos_a.x < pos_b.x + dims_b.x
        && pos_b.x < pos_a.x + dims_a.x
        && pos_a.y < pos_b.y + dims_b.y
        && pos_b.y < pos_a.y + dims_a.y
        && pos_a.z < pos_b.z + dims_b.z
        && pos_b.z < pos_a.z + dims_a.z
}

/// Checks whether a box placed at `pos` stays inside the truck envelope.
///
/// # Parameters
/// * `pos` - Minimum corner of the box
/// * `dims` - Extent of the box
/// * `truck` - Extent of the cargo bay
/// * `epsilon` - Tolerance added to every truck dimension
pub fn fits_in_bounds(pos: Vec3, dims: Vec3, truck: Vec3, epsilon: f64) -> bool {
    (pos + dims).fits_within(&truck, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_BOUNDS;

    #[test]
    fn face_contact_is_not_an_intersection() {
        let cube = Vec3::new(1.0, 1.0, 1.0);
        for neighbour in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ] {
            assert!(!intersects(Vec3::zero(), cube, neighbour, cube), "{:?}", neighbour);
        }
    }

    #[test]
    fn overlap_requires_all_three_axes() {
        let a = Vec3::new(2.0, 2.0, 2.0);
        // overlapping on x and y, separated on z
        assert!(!intersects(Vec3::zero(), a, Vec3::new(1.0, 1.0, 3.0), a));
        assert!(intersects(Vec3::zero(), a, Vec3::new(1.0, 1.0, 1.0), a));
        // fully contained
        assert!(intersects(
            Vec3::zero(),
            a,
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.1, 0.1, 0.1)
        ));
    }

    #[test]
    fn intersection_is_symmetric() {
        let pa = Vec3::new(0.3, 0.0, 0.2);
        let da = Vec3::new(1.0, 0.5, 0.7);
        let pb = Vec3::new(1.0, 0.4, 0.0);
        let db = Vec3::new(0.6, 0.6, 0.6);
        assert_eq!(intersects(pa, da, pb, db), intersects(pb, db, pa, da));
    }

    #[test]
    fn bounds_check_uses_tolerance() {
        let truck = Vec3::new(2.4, 1.2, 1.2);
        let cube = Vec3::new(1.2, 1.2, 1.2);

        assert!(fits_in_bounds(Vec3::new(1.2, 0.0, 0.0), cube, truck, EPSILON_BOUNDS));
        assert!(fits_in_bounds(
            Vec3::new(1.2 + 0.0005, 0.0, 0.0),
            cube,
            truck,
            EPSILON_BOUNDS
        ));
        assert!(!fits_in_bounds(Vec3::new(1.21, 0.0, 0.0), cube, truck, EPSILON_BOUNDS));
        assert!(!fits_in_bounds(Vec3::zero(), Vec3::new(1.2, 1.2, 1.3), truck, EPSILON_BOUNDS));
    }
}
