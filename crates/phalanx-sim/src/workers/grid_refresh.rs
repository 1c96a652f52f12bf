//! Keeps the cell grid synchronized with entity positions.

use std::collections::BTreeMap;

use phalanx_grid::cell::CellCoords;
use phalanx_grid::grid::CellChange;
use phalanx_store::entity::EntityId;

use crate::columns::{CellTag, Transform};
use crate::spatial::SpatialIndex;
use crate::worker::{MatchData, Worker};

/// Collects one [`CellChange`] per touched cell while scanning entities,
/// then applies the whole batch in `post_work`. An ordered map keeps the
/// batch order independent of the scan's discovery order.
#[derive(Default)]
pub struct GridRefreshWorker {
    changes: BTreeMap<CellCoords, CellChange>,
}

impl GridRefreshWorker {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fetch the pending change for `coords`, seeding it with the cell's
/// current membership on first touch.
fn seeded_change<'a>(
    changes: &'a mut BTreeMap<CellCoords, CellChange>,
    spatial: &SpatialIndex,
    coords: CellCoords,
) -> &'a mut CellChange {
    changes.entry(coords).or_insert_with(|| {
        let mut change = CellChange::new(coords);
        change
            .members
            .extend(spatial.entities_in_cell(coords).iter().copied());
        change
    })
}

impl Worker for GridRefreshWorker {
    fn name(&self) -> &'static str {
        "grid_refresh"
    }

    fn pre_work(&mut self, _dt: f32, _data: &mut MatchData) {
        self.changes.clear();
    }

    fn run_on_entity(&mut self, _dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(transform) = data.store.value_copied::<Transform>(id) else {
            return;
        };
        let Some(tag) = data.store.value_copied::<CellTag>(id) else {
            return;
        };

        let coords = data.spatial.coords_for(transform.position);
        if tag.placed && coords == tag.coords {
            return;
        }

        if tag.placed {
            seeded_change(&mut self.changes, &data.spatial, tag.coords)
                .members
                .remove(&id);
        }
        seeded_change(&mut self.changes, &data.spatial, coords)
            .members
            .insert(id);
        data.store.set_value(
            id,
            CellTag {
                coords,
                placed: true,
            },
        );
    }

    fn post_work(&mut self, _dt: f32, data: &mut MatchData) {
        if self.changes.is_empty() {
            return;
        }
        let changes: Vec<CellChange> = self.changes.values().cloned().collect();
        data.spatial.apply_cell_changes(&changes);
    }
}
