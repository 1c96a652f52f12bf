//! The positional vector type used throughout the simulation.
//!
//! [`Position`] is a plain 3-float vector with componentwise arithmetic,
//! squared-distance, and epsilon equality. Distance comparisons should prefer
//! [`Position::squared_distance`]; the square-rooted variant exists only for
//! the rare caller that needs the true magnitude.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A 3-dimensional position or direction vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const ZERO: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance to another position. Prefer this for comparisons;
    /// it avoids the square root entirely.
    #[inline]
    pub fn squared_distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// True distance to another position. Contains a square root; only use
    /// when the actual magnitude is required.
    #[inline]
    pub fn distance(self, other: Position) -> f32 {
        self.squared_distance(other).sqrt()
    }

    /// Componentwise epsilon equality.
    #[inline]
    pub fn approx_eq(self, other: Position, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }

    /// The unit-length vector pointing the same way, or zero for a zero
    /// vector (a zero movement direction must stay zero, not become NaN).
    pub fn normalized(self) -> Position {
        let len_sq = self.x * self.x + self.y * self.y + self.z * self.z;
        if len_sq == 0.0 {
            return Position::ZERO;
        }
        let inv = 1.0 / len_sq.sqrt();
        Position::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl Add for Position {
    type Output = Position;
    #[inline]
    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Position {
    #[inline]
    fn add_assign(&mut self, rhs: Position) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Position;
    #[inline]
    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Position {
    #[inline]
    fn sub_assign(&mut self, rhs: Position) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Position {
    type Output = Position;
    #[inline]
    fn mul(self, rhs: f32) -> Position {
        Position::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_arithmetic() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Position::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Position::new(0.5, 3.0, 1.0));
        assert_eq!(a * 2.0, Position::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn squared_distance_matches_distance() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.squared_distance(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn epsilon_equality() {
        let a = Position::new(1.0, 1.0, 1.0);
        let b = Position::new(1.005, 0.995, 1.0);
        assert!(a.approx_eq(b, 0.01));
        assert!(!a.approx_eq(b, 0.001));
    }

    #[test]
    fn normalized_unit_length() {
        let v = Position::new(3.0, 0.0, 4.0).normalized();
        let len = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalized_zero_stays_zero() {
        assert_eq!(Position::ZERO.normalized(), Position::ZERO);
    }
}
