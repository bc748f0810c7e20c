//! 2D vector math for the simulation plane.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

/// A point or displacement on the plane.
///
/// Two floats, so everything takes `self` by value and copies freely. Only
/// the operations the simulation needs are defined; compound assignment is
/// derived from the binary operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector of the given length pointing along `angle` (radians).
    #[inline]
    pub fn from_polar(length: f32, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(length * cos, length * sin)
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn distance_to(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Rotate counter-clockwise by `angle` radians.
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Scale to the given length, keeping the direction. A negative target
    /// length flips the direction; zero vectors stay zero.
    pub fn normalize_to_length(self, target: f32) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        self * (target / len)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Componentwise comparison within a tolerance.
    pub fn approx_eq(self, other: Vec2, tolerance: f32) -> bool {
        let delta = other - self;
        delta.x.abs() < tolerance && delta.y.abs() < tolerance
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl MulAssign<f32> for Vec2 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "{actual} is not close to {expected}"
        );
    }

    #[test]
    fn length_of_a_three_four_triangle() {
        let v = Vec2::new(3.0, -4.0);
        assert_close(v.length(), 5.0);
        assert_close(v.length_sq(), 25.0);
    }

    #[test]
    fn zero_vector_has_zero_length() {
        assert_close(Vec2::ZERO.length(), 0.0);
    }

    #[test]
    fn from_polar_points_along_the_angle() {
        assert!(Vec2::from_polar(2.0, 0.0).approx_eq(Vec2::new(2.0, 0.0), 1e-6));
        assert!(Vec2::from_polar(1.0, FRAC_PI_2).approx_eq(Vec2::new(0.0, 1.0), 1e-6));
        assert!(Vec2::from_polar(3.0, PI).approx_eq(Vec2::new(-3.0, 0.0), 1e-5));
    }

    #[test]
    fn from_polar_length_matches() {
        let v = Vec2::from_polar(7.5, 1.234);
        assert_close(v.length(), 7.5);
    }

    #[test]
    fn rotate_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotate(FRAC_PI_2);
        assert!(v.approx_eq(Vec2::new(0.0, 1.0), 1e-6));
    }

    #[test]
    fn rotate_half_turn_flips() {
        let v = Vec2::new(2.0, 1.0).rotate(PI);
        assert!(v.approx_eq(Vec2::new(-2.0, -1.0), 1e-5));
    }

    #[test]
    fn rotate_preserves_length() {
        let v = Vec2::new(3.0, -1.5);
        assert_close(v.rotate(0.789).length(), v.length());
    }

    #[test]
    fn normalize_to_length_rescales() {
        let v = Vec2::new(3.0, 4.0).normalize_to_length(10.0);
        assert!(v.approx_eq(Vec2::new(6.0, 8.0), 1e-5));
    }

    #[test]
    fn normalize_to_negative_length_flips_direction() {
        let v = Vec2::new(1.0, 0.0).normalize_to_length(-2.0);
        assert!(v.approx_eq(Vec2::new(-2.0, 0.0), 1e-6));
    }

    #[test]
    fn normalize_of_zero_stays_zero() {
        assert_eq!(Vec2::ZERO.normalize_to_length(5.0), Vec2::ZERO);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert_close(a.distance_to(b), 5.0);
        assert_close(b.distance_to(a), 5.0);
    }

    #[test]
    fn binary_operators() {
        let a = Vec2::new(1.0, -2.0);
        let b = Vec2::new(0.5, 4.0);
        assert_eq!(a + b, Vec2::new(1.5, 2.0));
        assert_eq!(a - b, Vec2::new(0.5, -6.0));
        assert_eq!(b * 2.0, Vec2::new(1.0, 8.0));
    }

    #[test]
    fn compound_assignment_matches_binary_ops() {
        let mut v = Vec2::new(1.0, 2.0);
        v += Vec2::new(0.5, 0.5);
        assert_eq!(v, Vec2::new(1.5, 2.5));
        v *= 2.0;
        assert_eq!(v, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn finiteness() {
        assert!(Vec2::new(1.0, 2.0).is_finite());
        assert!(!Vec2::new(f32::NAN, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f32::NEG_INFINITY).is_finite());
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        let v = Vec2::new(1.0, 2.0);
        assert!(v.approx_eq(Vec2::new(1.0001, 1.9999), 1e-3));
        assert!(!v.approx_eq(Vec2::new(1.01, 2.0), 1e-3));
    }

    #[test]
    fn msgpack_round_trip() {
        let v = Vec2::new(1.5, -2.25);
        let bytes = rmp_serde::to_vec(&v).unwrap();
        let back: Vec2 = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(v, back);
    }
}
