//! Two-dimensional vector arithmetic and parametric curve helpers.
//!
//! World positions, movement and targeting all work in continuous
//! floating-point space measured in grid cells. Grid coordinates convert with
//! [`Vector2::from_coord`].

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::grid::Coord;

// ---------------------------------------------------------------------------
// Vector2
// ---------------------------------------------------------------------------

/// A point or displacement in the plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    /// The origin.
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The centre of grid cell `coord`.
    #[inline]
    pub fn from_coord(coord: Coord) -> Self {
        Self::new(f64::from(coord.x), f64::from(coord.y))
    }

    /// Euclidean length.
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction. The zero vector stays zero.
    pub fn normalize(self) -> Self {
        let len = self.magnitude();
        if len == 0.0 {
            Self::ZERO
        } else {
            self / len
        }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Linear interpolation toward `target`; `t = 0` is `self`, `t = 1` is
    /// `target`. `t` is not clamped.
    pub fn lerp(self, target: Self, t: f64) -> Self {
        self + (target - self) * t
    }

    pub fn distance_to(self, other: Self) -> f64 {
        (other - self).magnitude()
    }

    /// Euclidean distance between `a` and `b`.
    pub fn distance_between(a: Self, b: Self) -> f64 {
        a.distance_to(b)
    }

    /// Projection parameter of `point` onto the infinite line through
    /// `start` and `end`.
    ///
    /// `0` maps to `start` and `1` to `end`. The result is not clamped. A
    /// degenerate segment (`start == end`) yields `0`.
    pub fn closest_point_percent(start: Self, end: Self, point: Self) -> f64 {
        let segment = end - start;
        let len_sq = segment.dot(segment);
        if len_sq == 0.0 {
            return 0.0;
        }
        (point - start).dot(segment) / len_sq
    }

    /// Projection of `point` onto the infinite line through `start` and
    /// `end`. Clamp [`closest_point_percent`](Self::closest_point_percent)
    /// to `[0, 1]` yourself for segment-bounded behavior.
    pub fn closest_point(start: Self, end: Self, point: Self) -> Self {
        start.lerp(end, Self::closest_point_percent(start, end, point))
    }
}

impl From<Coord> for Vector2 {
    fn from(coord: Coord) -> Self {
        Self::from_coord(coord)
    }
}

impl Add for Vector2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f64> for Vector2 {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl DivAssign<f64> for Vector2 {
    fn div_assign(&mut self, rhs: f64) {
        *self = *self / rhs;
    }
}

// ---------------------------------------------------------------------------
// Curves
// ---------------------------------------------------------------------------

/// Straight segment evaluated by a single lerp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCurve {
    pub start: Vector2,
    pub end: Vector2,
}

impl LinearCurve {
    pub fn new(start: Vector2, end: Vector2) -> Self {
        Self { start, end }
    }

    pub fn at(&self, t: f64) -> Vector2 {
        self.start.lerp(self.end, t)
    }
}

/// Quadratic curve through a control point, evaluated as a lerp of two lerps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BilinearCurve {
    pub start: Vector2,
    pub control: Vector2,
    pub end: Vector2,
}

impl BilinearCurve {
    pub fn new(start: Vector2, control: Vector2, end: Vector2) -> Self {
        Self {
            start,
            control,
            end,
        }
    }

    pub fn at(&self, t: f64) -> Vector2 {
        let a = self.start.lerp(self.control, t);
        let b = self.control.lerp(self.end, t);
        a.lerp(b, t)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
