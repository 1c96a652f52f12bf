//! Cell coordinates and the per-cell bookkeeping record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

// ---------------------------------------------------------------------------
// CellCoords
// ---------------------------------------------------------------------------

/// Coordinates of one cell in the grid, in `[0, grid_size)` on both axes.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CellCoords {
    pub x: i32,
    pub y: i32,
}

impl CellCoords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Debug for CellCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for CellCoords {
    type Output = CellCoords;
    fn add(self, rhs: CellCoords) -> CellCoords {
        CellCoords::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for CellCoords {
    type Output = CellCoords;
    fn sub(self, rhs: CellCoords) -> CellCoords {
        CellCoords::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for CellCoords {
    type Output = CellCoords;
    fn mul(self, rhs: f32) -> CellCoords {
        CellCoords::new((self.x as f32 * rhs) as i32, (self.y as f32 * rhs) as i32)
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One cell's claim on the shared id array: where its chunk starts, how many
/// slots hold live ids, and how many owned slots are currently unused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    /// Index of the first owned slot in the shared id array.
    pub start: usize,
    /// Leading owned slots holding live entity ids.
    pub used: usize,
    /// Trailing owned slots available for growth.
    pub free: usize,
}

impl Cell {
    /// Total slots this cell owns.
    #[inline]
    pub fn owned(&self) -> usize {
        self.used + self.free
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coords_arithmetic() {
        let a = CellCoords::new(3, 4);
        let b = CellCoords::new(1, 2);
        assert_eq!(a + b, CellCoords::new(4, 6));
        assert_eq!(a - b, CellCoords::new(2, 2));
        assert_eq!(a * 0.5, CellCoords::new(1, 2));
    }

    #[test]
    fn owned_is_used_plus_free() {
        let cell = Cell {
            start: 10,
            used: 3,
            free: 2,
        };
        assert_eq!(cell.owned(), 5);
    }
}
