//! The spatial partition grid and its slot-rebalancing transaction.
//!
//! A [`CellGrid`] divides the map into `grid_size * grid_size` square cells
//! sharing one fixed id array with exactly `capacity` slots. Each cell owns a
//! contiguous chunk of that array; chunks tile the array in row-major cell
//! order with no gaps and no overlap. When a cell's membership outgrows its
//! chunk, [`apply_cell_changes`](CellGrid::apply_cell_changes) takes free
//! slots from neighbouring chunks and shifts the chunks in between, so the
//! tiling invariant survives every update without reallocating.

use std::collections::BTreeSet;

use tracing::trace;

use phalanx_store::entity::EntityId;

use crate::cell::{Cell, CellCoords};

// ---------------------------------------------------------------------------
// CellChange
// ---------------------------------------------------------------------------

/// The full new membership of one cell for this tick's grid transaction.
///
/// An ordered set keeps the written slot order deterministic regardless of
/// the order members were discovered in.
#[derive(Debug, Clone, Default)]
pub struct CellChange {
    pub coords: CellCoords,
    pub members: BTreeSet<EntityId>,
}

impl CellChange {
    pub fn new(coords: CellCoords) -> Self {
        Self {
            coords,
            members: BTreeSet::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Distribution scratch
// ---------------------------------------------------------------------------

/// Flat snapshot of every cell's chunk start / owned / free counts, mutated
/// during change resolution and applied back to the grid in one step.
struct Distribution {
    positions: Vec<usize>,
    owned: Vec<usize>,
    free: Vec<usize>,
}

impl Distribution {
    fn snapshot(cells: &[Cell]) -> Self {
        Self {
            positions: cells.iter().map(|c| c.start).collect(),
            owned: cells.iter().map(|c| c.owned()).collect(),
            free: cells.iter().map(|c| c.free).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// CellGrid
// ---------------------------------------------------------------------------

/// Square spatial partition over a shared fixed-capacity id array.
pub struct CellGrid {
    size: usize,
    cells: Vec<Cell>,
    slots: Vec<EntityId>,
}

impl CellGrid {
    /// Build a grid whose cells evenly split `capacity` id slots; when the
    /// split is uneven, the leading cells (row-major) get one extra slot.
    pub fn new(capacity: u32, grid_size: usize) -> Self {
        assert!(grid_size > 0, "grid size must be positive");
        let capacity = capacity as usize;
        let cell_count = grid_size * grid_size;
        let base = capacity / cell_count;
        let mut remainder = capacity % cell_count;

        let mut cells = Vec::with_capacity(cell_count);
        let mut cursor = 0;
        for _ in 0..cell_count {
            let mut assigned = base;
            if remainder > 0 {
                assigned += 1;
                remainder -= 1;
            }
            cells.push(Cell {
                start: cursor,
                used: 0,
                free: assigned,
            });
            cursor += assigned;
        }

        Self {
            size: grid_size,
            cells,
            slots: vec![EntityId::EMPTY; capacity],
        }
    }

    pub fn grid_size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, coords: CellCoords) -> bool {
        coords.x >= 0
            && coords.y >= 0
            && (coords.x as usize) < self.size
            && (coords.y as usize) < self.size
    }

    #[inline]
    fn index(&self, coords: CellCoords) -> usize {
        debug_assert!(self.contains(coords), "cell {coords:?} out of bounds");
        coords.x as usize * self.size + coords.y as usize
    }

    pub fn cell(&self, coords: CellCoords) -> &Cell {
        &self.cells[self.index(coords)]
    }

    /// Live entity ids currently stored in `coords`, in slot order.
    pub fn entities_in_cell(&self, coords: CellCoords) -> &[EntityId] {
        let cell = &self.cells[self.index(coords)];
        &self.slots[cell.start..cell.start + cell.used]
    }

    /// Like [`entities_in_cell`](Self::entities_in_cell), filtered.
    pub fn entities_in_cell_where(
        &self,
        coords: CellCoords,
        mut keep: impl FnMut(EntityId) -> bool,
    ) -> Vec<EntityId> {
        self.entities_in_cell(coords)
            .iter()
            .copied()
            .filter(|&id| keep(id))
            .collect()
    }

    // -- rebalancing transaction --------------------------------------------

    /// Apply one tick's worth of cell membership changes.
    ///
    /// Callers must pass a *consistent* set: every entity appearing in some
    /// change's members must also be absent from the members of the cell it
    /// left (that cell must therefore also appear in `changes`). The grid
    /// does not cross-check this.
    ///
    /// Changes that fit their cell's current chunk resolve in place. Changes
    /// that do not trigger a structural pass that pulls free slots from
    /// chunks before the cell first, then after it, shifting every chunk in
    /// between.
    ///
    /// # Panics
    ///
    /// Panics when the grid as a whole has fewer free slots than the changes
    /// require. Total membership never exceeds the entity table capacity,
    /// which equals the slot count, so this only fires on an inconsistent
    /// change set.
    pub fn apply_cell_changes(&mut self, changes: &[CellChange]) {
        let mut dist = Distribution::snapshot(&self.cells);

        // Pass 1: in-place changes; collect the ones that need extra slots.
        let mut structural: Vec<&CellChange> = Vec::new();
        for change in changes {
            let idx = self.index(change.coords);
            if dist.owned[idx] < change.members.len() {
                structural.push(change);
            } else {
                dist.free[idx] = dist.owned[idx] - change.members.len();
            }
        }

        if !structural.is_empty() {
            trace!(cells = structural.len(), "rebalancing cell chunks");
        }

        // Pass 2: pull free slots from neighbouring chunks.
        for change in structural {
            let idx = self.index(change.coords);
            let needed = change.members.len() - dist.owned[idx];
            let mut found = self.take_backward(&mut dist, idx, needed);
            if found < needed {
                found += self.take_forward(&mut dist, idx, needed - found);
            }
            if found != needed {
                panic!(
                    "cell {:?} needs {needed} extra slots but the grid only found {found}",
                    change.coords
                );
            }
            dist.free[idx] = 0;
        }

        self.assert_contiguous(&dist);
        self.apply_distribution(&dist);

        // Pass 3: write the new memberships.
        for change in changes {
            let idx = self.index(change.coords);
            let cell = self.cells[idx];
            assert!(
                cell.owned() >= change.members.len(),
                "cell {:?} chunk too small after rebalance",
                change.coords
            );
            let mut written = 0;
            for &id in &change.members {
                self.slots[cell.start + written] = id;
                written += 1;
            }
            let owned = cell.owned();
            let cell = &mut self.cells[idx];
            cell.used = written;
            cell.free = owned - written;
            for i in 0..cell.free {
                self.slots[cell.start + written + i] = EntityId::EMPTY;
            }
        }
    }

    /// Walk chunks before `idx`, taking free slots until `asked` are found
    /// or the array start is reached. Every chunk between the donor and the
    /// requesting cell (inclusive) shifts down by the amount taken so far.
    fn take_backward(&self, dist: &mut Distribution, idx: usize, asked: usize) -> usize {
        let mut shifting = vec![idx];
        let mut found = 0;
        let mut cursor = idx;
        while cursor > 0 && found < asked {
            let donor = cursor - 1;
            let take = (asked - found).min(dist.free[donor]);
            found += take;
            dist.free[donor] -= take;
            dist.owned[donor] -= take;
            if take > 0 {
                for &cell in &shifting {
                    dist.positions[cell] -= take;
                }
            }
            shifting.push(donor);
            cursor = donor;
        }
        dist.free[idx] += found;
        dist.owned[idx] += found;
        found
    }

    /// Forward counterpart of [`take_backward`](Self::take_backward): the
    /// requesting chunk keeps its start and the chunks after it shift up.
    fn take_forward(&self, dist: &mut Distribution, idx: usize, asked: usize) -> usize {
        let last = self.cells.len() - 1;
        let mut shifting: Vec<usize> = Vec::new();
        let mut found = 0;
        let mut cursor = idx;
        while cursor < last && found < asked {
            let donor = cursor + 1;
            let take = (asked - found).min(dist.free[donor]);
            found += take;
            dist.free[donor] -= take;
            dist.owned[donor] -= take;
            shifting.push(donor);
            if take > 0 {
                for &cell in &shifting {
                    dist.positions[cell] += take;
                }
            }
            cursor = donor;
        }
        dist.free[idx] += found;
        dist.owned[idx] += found;
        found
    }

    /// Chunks must tile the id array: each chunk ends where the next starts.
    /// A broken partition is fatal in release builds too; the whole grid is
    /// corrupt at that point.
    fn assert_contiguous(&self, dist: &Distribution) {
        assert_eq!(dist.positions[0], 0, "first chunk must start at 0");
        for i in 0..self.cells.len() - 1 {
            assert_eq!(
                dist.positions[i] + dist.owned[i],
                dist.positions[i + 1],
                "chunk {i} does not end where chunk {} starts",
                i + 1
            );
        }
        let last = self.cells.len() - 1;
        assert_eq!(
            dist.positions[last] + dist.owned[last],
            self.slots.len(),
            "last chunk must end at the array's end"
        );
    }

    /// Resize and move every chunk to match the resolved distribution,
    /// copying live ids from a snapshot of the old array.
    fn apply_distribution(&mut self, dist: &Distribution) {
        let old_slots = self.slots.clone();
        for idx in 0..self.cells.len() {
            let cell = &mut self.cells[idx];

            let new_owned = dist.owned[idx];
            if new_owned != cell.owned() {
                let delta = new_owned as isize - cell.owned() as isize;
                let new_free = cell.free as isize + delta;
                let new_used = cell.used as isize + new_free.min(0);
                cell.used = new_used.max(0) as usize;
                cell.free = new_free.max(0) as usize;
            }

            let new_start = dist.positions[idx];
            if cell.start != new_start {
                if cell.used > 0 {
                    let (start, used) = (cell.start, cell.used);
                    self.slots[new_start..new_start + used]
                        .copy_from_slice(&old_slots[start..start + used]);
                }
                self.cells[idx].start = new_start;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
