//! The match orchestrator: owns all match state and runs the tick loop.
//!
//! A match is either authoritative (the server instance whose outcomes are
//! law) or a mirror (a client instance replaying the same inputs). Both run
//! the identical deterministic pipeline; the flag only controls which
//! workers run and whether accepted data-change events are re-emitted for
//! replication.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use phalanx_grid::cell::CellCoords;
use phalanx_grid::grid::CellChange;
use phalanx_store::entity::EntityId;
use phalanx_store::event::DataChangeEvent;
use phalanx_store::registry::ColumnRegistry;
use phalanx_store::store::{EntityStore, SpawnRequest};

use crate::catalog::{standard_catalog, ObjectCatalog};
use crate::columns::{register_standard_columns, CellTag};
use crate::spatial::SpatialIndex;
use crate::worker::{MatchData, Worker};
use crate::workers::{
    ArrivalWorker, CollisionWorker, GridRefreshWorker, MovementWorker, OrderMovementWorker,
    ProductionWorker, TargetingWorker, WeaponWorker,
};

// ---------------------------------------------------------------------------
// MatchConfig
// ---------------------------------------------------------------------------

/// Sizing and role of one match instance.
///
/// Both sides of a replicated match must agree on everything here except
/// `authoritative`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Fixed entity table capacity; also the grid's total slot count.
    pub max_entities: u32,
    /// Cells per side of the square grid.
    pub grid_cells: usize,
    /// World size of one square cell.
    pub cell_size: f32,
    pub authoritative: bool,
    /// Seed for all simulation randomness (production jitter).
    pub rng_seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_entities: 1000,
            grid_cells: 50,
            cell_size: 2.0,
            authoritative: true,
            rng_seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchState & TickReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchState {
    Constructed,
    Running,
    Ended,
}

/// What one tick did to the entity population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub spawned: Vec<EntityId>,
    pub destroyed: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// One running simulation instance.
pub struct Match {
    config: MatchConfig,
    state: MatchState,
    data: MatchData,
    catalog: ObjectCatalog,
    workers: Vec<Box<dyn Worker>>,
    tick: u64,
    clock: f32,
    outgoing: Vec<DataChangeEvent>,
}

impl Match {
    /// Build a match with the standard columns, catalog and worker pipeline.
    pub fn new(config: MatchConfig) -> Self {
        let mut registry = ColumnRegistry::new();
        register_standard_columns(&mut registry);
        let catalog = standard_catalog(&registry);
        let store = EntityStore::new(config.max_entities, registry);
        let spatial = SpatialIndex::new(config.max_entities, config.grid_cells, config.cell_size);

        let workers: Vec<Box<dyn Worker>> = vec![
            Box::new(GridRefreshWorker::new()),
            Box::new(TargetingWorker::new()),
            Box::new(OrderMovementWorker::new()),
            Box::new(MovementWorker::new()),
            Box::new(ArrivalWorker::new()),
            Box::new(WeaponWorker::new()),
            Box::new(ProductionWorker::new(config.rng_seed)),
            Box::new(CollisionWorker::new()),
        ];

        Self {
            config,
            state: MatchState::Constructed,
            data: MatchData { store, spatial },
            catalog,
            workers,
            tick: 0,
            clock: 0.0,
            outgoing: Vec::new(),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Seconds of simulated time since the match started.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn store(&self) -> &EntityStore {
        &self.data.store
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.data.spatial
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    /// Enqueue the starting units and begin running.
    pub fn start(&mut self, initial_spawns: &[SpawnRequest]) {
        if self.state != MatchState::Constructed {
            warn!(state = ?self.state, "ignoring start on a match that already started");
            return;
        }
        for &request in initial_spawns {
            self.data.store.request_spawn(request);
        }
        self.state = MatchState::Running;
        debug!(
            units = initial_spawns.len(),
            authoritative = self.config.authoritative,
            "match started"
        );
    }

    pub fn force_end(&mut self) {
        self.state = MatchState::Ended;
    }

    /// Enqueue a spawn; drained at the start of the next tick.
    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.data.store.request_spawn(request);
    }

    /// Enqueue a destroy; drained at the start of the next tick.
    pub fn request_destroy(&mut self, id: EntityId) {
        self.data.store.request_destroy(id);
    }

    /// Run one simulation step.
    ///
    /// Order within the tick: drain destroy requests, drain spawn requests,
    /// then run the worker pipeline. Requests workers enqueue during the
    /// pipeline are drained at the start of the next tick, so the alive set
    /// is stable while workers run.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        if self.state != MatchState::Running {
            warn!(state = ?self.state, "tick on a match that is not running");
            return TickReport::default();
        }
        self.tick += 1;
        self.clock += dt;

        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        self.drain_destroys(&mut report);
        self.drain_spawns(&mut report);
        self.run_workers(dt);

        report
    }

    fn drain_destroys(&mut self, report: &mut TickReport) {
        let mut evictions: BTreeMap<CellCoords, CellChange> = BTreeMap::new();
        while let Some(id) = self.data.store.take_destroy_request() {
            if !self.data.store.is_alive(id) {
                warn!(entity = %id, "ignoring destroy request for an already-dead entity");
                continue;
            }
            if let Some(tag) = self.data.store.value_copied::<CellTag>(id) {
                if tag.placed {
                    evictions
                        .entry(tag.coords)
                        .or_insert_with(|| {
                            let mut change = CellChange::new(tag.coords);
                            change.members.extend(
                                self.data.spatial.entities_in_cell(tag.coords).iter().copied(),
                            );
                            change
                        })
                        .members
                        .remove(&id);
                }
            }
            self.data.store.destroy(id);
            report.destroyed.push(id);
        }
        if !evictions.is_empty() {
            let changes: Vec<CellChange> = evictions.into_values().collect();
            self.data.spatial.apply_cell_changes(&changes);
        }
    }

    fn drain_spawns(&mut self, report: &mut TickReport) {
        while let Some(request) = self.data.store.take_spawn_request() {
            match self.catalog.spawn(&mut self.data.store, &request) {
                Ok(Some(id)) => report.spawned.push(id),
                Ok(None) => {}
                Err(error) => {
                    warn!(%error, "spawn request dropped");
                }
            }
        }
    }

    fn run_workers(&mut self, dt: f32) {
        let authoritative = self.config.authoritative;
        let live: Vec<EntityId> = self.data.store.live_entities().collect();

        for worker in &mut self.workers {
            if authoritative || !worker.authoritative_only() {
                worker.on_frame_begin(dt, &mut self.data);
            }
        }
        for worker in &mut self.workers {
            if authoritative || !worker.authoritative_only() {
                worker.pre_work(dt, &mut self.data);
                for &id in &live {
                    worker.run_on_entity(dt, id, &mut self.data);
                }
                worker.post_work(dt, &mut self.data);
            }
        }
        for worker in &mut self.workers {
            if authoritative || !worker.authoritative_only() {
                worker.on_frame_end(dt, &mut self.data);
            }
        }
    }

    // -- replication --------------------------------------------------------

    /// Apply an incoming data-change event to the match state.
    ///
    /// On an authoritative match, accepted events are queued for re-emission
    /// to every mirror; rejected events are dropped (the store already
    /// logged why). Returns whether the event was accepted.
    pub fn ingest_event(&mut self, event: &DataChangeEvent) -> bool {
        let accepted = self.data.store.apply_data_change(event);
        if accepted && self.config.authoritative {
            self.outgoing.push(event.clone());
        }
        accepted
    }

    /// Take the events queued for replication since the last drain.
    pub fn drain_outgoing(&mut self) -> Vec<DataChangeEvent> {
        std::mem::take(&mut self.outgoing)
    }

    // -- synchronization ----------------------------------------------------

    /// Digest of the full simulation state. Two instances that processed the
    /// same inputs report the same digest at the same tick; comparing them
    /// is how desynchronization is detected.
    pub fn state_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.tick.to_le_bytes());
        hasher.update(self.data.store.state_digest().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GRUNT;
    use phalanx_store::event::PlayerId;
    use phalanx_store::position::Position;

    fn grunt_at(x: f32, z: f32, player: i32) -> SpawnRequest {
        SpawnRequest {
            object_type: GRUNT.0,
            owner: PlayerId(player),
            position: Position::new(x, 0.0, z),
        }
    }

    #[test]
    fn tick_before_start_is_a_noop() {
        let mut m = Match::new(MatchConfig::default());
        let report = m.tick(0.1);
        assert_eq!(report, TickReport::default());
        assert_eq!(m.tick_count(), 0);
    }

    #[test]
    fn start_spawns_initial_units_on_first_tick() {
        let mut m = Match::new(MatchConfig::default());
        m.start(&[grunt_at(1.0, 1.0, 1), grunt_at(40.0, 40.0, 2)]);
        assert_eq!(m.store().alive_count(), 0);

        let report = m.tick(0.1);
        assert_eq!(report.tick, 1);
        assert_eq!(report.spawned, vec![EntityId(0), EntityId(1)]);
        assert_eq!(m.store().alive_count(), 2);
    }

    #[test]
    fn destroyed_entities_leave_the_grid() {
        let mut m = Match::new(MatchConfig::default());
        m.start(&[grunt_at(1.0, 1.0, 1)]);
        m.tick(0.1);

        let coords = m.spatial().coords_for(Position::new(1.0, 0.0, 1.0));
        assert_eq!(m.spatial().entities_in_cell(coords), &[EntityId(0)]);

        m.request_destroy(EntityId(0));
        let report = m.tick(0.1);
        assert_eq!(report.destroyed, vec![EntityId(0)]);
        assert!(m.spatial().entities_in_cell(coords).is_empty());
    }

    #[test]
    fn duplicate_destroy_requests_destroy_once() {
        let mut m = Match::new(MatchConfig::default());
        m.start(&[grunt_at(1.0, 1.0, 1)]);
        m.tick(0.1);

        // The second request finds the entity already dead; it warns and is
        // skipped, so the report lists the destroy exactly once.
        m.request_destroy(EntityId(0));
        m.request_destroy(EntityId(0));
        let report = m.tick(0.1);
        assert_eq!(report.destroyed, vec![EntityId(0)]);
        assert_eq!(m.store().alive_count(), 0);

        // A stale request in a later tick is skipped the same way.
        m.request_destroy(EntityId(0));
        let report = m.tick(0.1);
        assert!(report.destroyed.is_empty());
    }

    #[test]
    fn force_end_stops_ticking() {
        let mut m = Match::new(MatchConfig::default());
        m.start(&[]);
        m.tick(0.1);
        m.force_end();
        assert_eq!(m.state(), MatchState::Ended);
        let report = m.tick(0.1);
        assert_eq!(report, TickReport::default());
        assert_eq!(m.tick_count(), 1);
    }

    #[test]
    fn authoritative_only_workers_are_gated() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Probe {
            runs: Rc<Cell<u32>>,
        }

        impl Worker for Probe {
            fn name(&self) -> &'static str {
                "probe"
            }
            fn authoritative_only(&self) -> bool {
                true
            }
            fn on_frame_begin(&mut self, _dt: f32, _data: &mut MatchData) {
                self.runs.set(self.runs.get() + 1);
            }
        }

        for (authoritative, expected_runs) in [(true, 1), (false, 0)] {
            let runs = Rc::new(Cell::new(0));
            let mut m = Match::new(MatchConfig {
                authoritative,
                ..MatchConfig::default()
            });
            m.workers.push(Box::new(Probe { runs: Rc::clone(&runs) }));
            m.start(&[]);
            m.tick(0.1);
            assert_eq!(runs.get(), expected_runs);
        }
    }

    #[test]
    fn table_full_drops_spawns_and_keeps_running() {
        let config = MatchConfig {
            max_entities: 2,
            grid_cells: 2,
            ..MatchConfig::default()
        };
        let mut m = Match::new(config);
        m.start(&[grunt_at(0.5, 0.5, 1), grunt_at(1.0, 1.0, 1), grunt_at(1.5, 1.5, 1)]);
        let report = m.tick(0.1);
        assert_eq!(report.spawned.len(), 2);
        assert_eq!(m.store().alive_count(), 2);
        assert_eq!(m.state(), MatchState::Running);
    }
}
