//! Common types and traits for cargo-bay geometry.
//!
//! Positions and extents share one vector type. Axes follow the order in
//! which dimensions are written down: `x` runs along the length of the bay,
//! `y` along its width and `z` along its height.

use std::ops::Add;

/// Tolerance for boundary containment checks, in meters.
///
/// Absorbs the drift that builds up when anchor coordinates are produced by
/// repeated additions. Must stay well below anything visible in a render.
pub const EPSILON_BOUNDS: f64 = 1e-3;

/// Upper limit accepted for a configured containment tolerance.
pub const EPSILON_BOUNDS_MAX: f64 = 1e-2;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```
/// use truck_packer::types::Vec3;
///
/// let anchor = Vec3::new(1.2, 0.0, 0.0);
/// let extent = Vec3::new(1.2, 1.2, 1.2);
/// assert_eq!((anchor + extent).x, 2.4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin of the cargo bay).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Product of all components. Meaningful for extent vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if the vector lies within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The outer vector (e.g., truck dimensions)
    /// * `tolerance` - Numerical tolerance added to every component of `outer`
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance
            && self.y <= outer.y + tolerance
            && self.z <= outer.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

impl From<Vec3> for (f64, f64, f64) {
    #[inline]
    fn from(vec: Vec3) -> Self {
        vec.as_tuple()
    }
}

/// Trait for objects with a 3D extent.
pub trait Dimensional {
    /// Returns the extent as a vector `(length, width, height)`.
    fn extent(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.extent().volume()
    }
}

/// Trait for objects with a position in the cargo bay.
pub trait Positioned {
    /// Returns the minimum corner.
    fn position(&self) -> Vec3;
}

/// Validation helpers shared by the model constructors.
pub mod validation {

    /// Validates a single dimension.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(Vec3::from((1.0, 2.0, 3.0)), a);
        assert_eq!(<(f64, f64, f64)>::from(b), (4.0, 5.0, 6.0));
    }

    #[test]
    fn test_vec3_volume() {
        let dims = Vec3::new(2.0, 1.5, 0.5);
        assert!((dims.volume() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_vec3_fits_within() {
        let small = Vec3::new(1.2, 1.2, 1.2);
        let large = Vec3::new(2.4, 1.2, 1.2);

        assert!(small.fits_within(&large, 0.0));
        assert!(!large.fits_within(&small, EPSILON_BOUNDS));
        assert!(Vec3::new(1.2005, 1.2, 1.2).fits_within(&small, EPSILON_BOUNDS));
    }

    #[test]
    fn test_validation_dimension() {
        assert!(validation::validate_dimension(1.2, "Length").is_ok());
        assert!(validation::validate_dimension(0.0, "Length").is_err());
        assert!(validation::validate_dimension(-1.0, "Length").is_err());
        assert!(validation::validate_dimension(f64::NAN, "Length").is_err());
        assert!(validation::validate_dimension(f64::INFINITY, "Length").is_err());
    }
}
