//! Phalanx grid -- spatial partition over a shared fixed id array.
//!
//! Cells are dynamic owners of contiguous chunks of one preallocated entity
//! id array. The total slot count equals the entity table's capacity, so any
//! distribution of entities over the map always fits; the rebalancing
//! transaction in [`grid::CellGrid::apply_cell_changes`] moves chunk
//! boundaries around to make room wherever entities cluster.

#![deny(unsafe_code)]

pub mod cell;
pub mod grid;

pub mod prelude {
    pub use crate::cell::{Cell, CellCoords};
    pub use crate::grid::{CellChange, CellGrid};
}
