//! World-space view over the cell grid.
//!
//! [`SpatialIndex`] pairs a [`CellGrid`] with the world size of one cell and
//! maps positions to cell coordinates. The map's origin sits at the world
//! origin; positions outside the grid clamp to the border cells, so every
//! entity always has a home cell.

use phalanx_grid::cell::CellCoords;
use phalanx_grid::grid::{CellChange, CellGrid};
use phalanx_store::entity::EntityId;
use phalanx_store::position::Position;

// ---------------------------------------------------------------------------
// SpatialIndex
// ---------------------------------------------------------------------------

pub struct SpatialIndex {
    grid: CellGrid,
    cell_size: f32,
}

impl SpatialIndex {
    pub fn new(capacity: u32, grid_cells: usize, cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            grid: CellGrid::new(capacity, grid_cells),
            cell_size,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// The cell containing `position`, on the ground plane (x and z; height
    /// is ignored). Out-of-bounds positions clamp to the border.
    pub fn coords_for(&self, position: Position) -> CellCoords {
        let max = self.grid.grid_size() as i32 - 1;
        let x = ((position.x / self.cell_size) as i32).clamp(0, max);
        let z = ((position.z / self.cell_size) as i32).clamp(0, max);
        CellCoords::new(x, z)
    }

    /// Live entity ids in one cell, in slot order.
    pub fn entities_in_cell(&self, coords: CellCoords) -> &[EntityId] {
        self.grid.entities_in_cell(coords)
    }

    /// Like [`entities_in_cell`](Self::entities_in_cell), filtered.
    pub fn entities_in_cell_where(
        &self,
        coords: CellCoords,
        keep: impl FnMut(EntityId) -> bool,
    ) -> Vec<EntityId> {
        self.grid.entities_in_cell_where(coords, keep)
    }

    pub fn apply_cell_changes(&mut self, changes: &[CellChange]) {
        self.grid.apply_cell_changes(changes);
    }

    /// Visit the in-bounds cells on the square ring `range` cells away from
    /// `center` (range 0 is the center cell itself), in a fixed order.
    pub fn for_each_on_ring(
        &self,
        center: CellCoords,
        range: i32,
        mut visit: impl FnMut(CellCoords),
    ) {
        let hi = CellCoords::new(center.x + range, center.y + range);
        let lo = CellCoords::new(center.x - range, center.y - range);
        for x in (lo.x..=hi.x).rev() {
            for y in (lo.y..=hi.y).rev() {
                let coords = CellCoords::new(x, y);
                if !self.grid.contains(coords) {
                    continue;
                }
                if x == lo.x || x == hi.x || y == lo.y || y == hi.y {
                    visit(coords);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_map_to_cells() {
        let index = SpatialIndex::new(100, 4, 2.0);
        assert_eq!(index.coords_for(Position::ZERO), CellCoords::new(0, 0));
        assert_eq!(
            index.coords_for(Position::new(3.9, 0.0, 6.1)),
            CellCoords::new(1, 3)
        );
        // Height never matters.
        assert_eq!(
            index.coords_for(Position::new(3.9, 50.0, 6.1)),
            CellCoords::new(1, 3)
        );
    }

    #[test]
    fn out_of_bounds_positions_clamp() {
        let index = SpatialIndex::new(100, 4, 2.0);
        assert_eq!(
            index.coords_for(Position::new(-10.0, 0.0, 999.0)),
            CellCoords::new(0, 3)
        );
    }

    #[test]
    fn ring_zero_is_the_center_cell() {
        let index = SpatialIndex::new(100, 5, 2.0);
        let mut seen = Vec::new();
        index.for_each_on_ring(CellCoords::new(2, 2), 0, |c| seen.push(c));
        assert_eq!(seen, vec![CellCoords::new(2, 2)]);
    }

    #[test]
    fn ring_one_is_the_eight_neighbours() {
        let index = SpatialIndex::new(100, 5, 2.0);
        let mut seen = Vec::new();
        index.for_each_on_ring(CellCoords::new(2, 2), 1, |c| seen.push(c));
        assert_eq!(seen.len(), 8);
        assert!(!seen.contains(&CellCoords::new(2, 2)));
    }

    #[test]
    fn rings_clip_at_the_border() {
        let index = SpatialIndex::new(100, 5, 2.0);
        let mut seen = Vec::new();
        index.for_each_on_ring(CellCoords::new(0, 0), 1, |c| seen.push(c));
        // Only (1,1), (1,0), (0,1) are in bounds.
        assert_eq!(seen.len(), 3);
    }
}
