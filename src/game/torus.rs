//! Toroidal field geometry.
//!
//! The field is a torus: everything that leaves on the left comes back in on
//! the right, and the same for top and bottom. Two operations define the
//! geometry: `wrap` maps a point into the canonical rectangle, `unwrap`
//! picks the representative of a point closest to a reference. All pairwise
//! distances unwrap the second argument against the first.

use crate::util::vec2::Vec2;

/// Wrapped-plane geometry for a field of a fixed size.
#[derive(Debug, Clone, Copy)]
pub struct TorusGeometry {
    width: f32,
    height: f32,
}

impl TorusGeometry {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Map a point into the canonical rectangle `[0, W) x [0, H)`.
    #[inline]
    pub fn wrap(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(v.x, self.width),
            wrap_axis(v.y, self.height),
        )
    }

    /// Return the representative of `v` closest to `ref_point`.
    ///
    /// The result is congruent to `v` modulo the field size and within half
    /// a field size of the reference on each axis. It may lie outside the
    /// canonical rectangle.
    #[inline]
    pub fn unwrap(&self, v: Vec2, ref_point: Vec2) -> Vec2 {
        Vec2::new(
            ref_point.x + half_range_offset(v.x - ref_point.x, self.width),
            ref_point.y + half_range_offset(v.y - ref_point.y, self.height),
        )
    }

    /// Map a difference vector into `[-W/2, W/2] x [-H/2, H/2]`.
    #[inline]
    pub fn unwrap_relative(&self, relative: Vec2) -> Vec2 {
        Vec2::new(
            half_range_offset(relative.x, self.width),
            half_range_offset(relative.y, self.height),
        )
    }

    /// Euclidean distance on the torus (shortest representative).
    #[inline]
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        (self.unwrap(b, a) - a).length()
    }
}

/// Shift `delta` by multiples of `period` into `[-period/2, period/2)`.
#[inline]
fn half_range_offset(delta: f32, period: f32) -> f32 {
    (delta + period / 2.0).rem_euclid(period) - period / 2.0
}

/// `rem_euclid` can round up to exactly `period` for tiny negative inputs;
/// fold that back to keep the half-open range.
#[inline]
fn wrap_axis(value: f32, period: f32) -> f32 {
    let wrapped = value.rem_euclid(period);
    if wrapped >= period {
        wrapped - period
    } else {
        wrapped
    }
}
