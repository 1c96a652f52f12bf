//! The fixed-capacity entity table and its column containers.
//!
//! [`EntityStore`] owns one [`EntityRecord`](crate::entity::EntityRecord) per
//! possible entity id plus one container per registered column type. All
//! mutation funnels through the match orchestrator: external collaborators
//! only enqueue spawn/destroy requests, which the orchestrator drains once
//! per tick.
//!
//! # Determinism
//!
//! Spawning always takes the lowest dead id, containers allocate from their
//! own free lists, and queues are drained FIFO: identical request sequences
//! therefore produce identical stores, which [`EntityStore::state_digest`]
//! can verify across an authoritative/mirror pair.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::archetype::Archetype;
use crate::column::{AnyColumn, Column, ColumnData, SlotId};
use crate::entity::{EntityId, EntityRecord};
use crate::event::{DataChangeEvent, PlayerId};
use crate::position::Position;
use crate::registry::{ColumnRegistry, ColumnTypeId};
use crate::StoreError;

// ---------------------------------------------------------------------------
// SpawnRequest
// ---------------------------------------------------------------------------

/// A request to create one entity, enqueued by match-start logic or by
/// production workers and drained by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Index into the match's object-type catalog.
    pub object_type: u16,
    pub owner: PlayerId,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

/// Fixed-capacity entity table plus one typed container per column type.
pub struct EntityStore {
    capacity: u32,
    records: Vec<EntityRecord>,
    registry: ColumnRegistry,
    /// Indexed by `ColumnTypeId.0`.
    containers: Vec<Box<dyn AnyColumn>>,
    spawn_requests: VecDeque<SpawnRequest>,
    destroy_requests: VecDeque<EntityId>,
}

impl EntityStore {
    /// Build a store for at most `capacity` entities over the closed column
    /// set in `registry`. Registration is finished at this point; the
    /// registry moves into the store.
    pub fn new(capacity: u32, registry: ColumnRegistry) -> Self {
        let containers = registry.build_containers(capacity);
        Self {
            capacity,
            records: vec![EntityRecord::dead(); capacity as usize],
            registry,
            containers,
            spawn_requests: VecDeque::new(),
            destroy_requests: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    // -- lifecycle ----------------------------------------------------------

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.records
            .get(id.index())
            .map(|r| r.alive)
            .unwrap_or(false)
    }

    pub fn alive_count(&self) -> usize {
        self.records.iter().filter(|r| r.alive).count()
    }

    /// Iterate living entity ids in ascending order.
    pub fn live_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alive)
            .map(|(i, _)| EntityId(i as u32))
    }

    /// Mark the lowest dead id alive and return it. A full table is a
    /// recoverable failure: the caller logs and skips the spawn.
    pub fn spawn_empty(&mut self) -> Result<EntityId, StoreError> {
        for (i, record) in self.records.iter_mut().enumerate() {
            if !record.alive {
                record.alive = true;
                return Ok(EntityId(i as u32));
            }
        }
        Err(StoreError::TableFull {
            capacity: self.capacity,
        })
    }

    /// Spawn an entity and attach every column in `archetype` with its
    /// default value.
    pub fn spawn_with_archetype(&mut self, archetype: &Archetype) -> Result<EntityId, StoreError> {
        let id = self.spawn_empty()?;
        archetype.attach_all(self, id);
        Ok(id)
    }

    /// Destroy an entity: release every owned column slot back to its
    /// container, then clear the record. Destroying an already-dead entity
    /// warns and does nothing.
    pub fn destroy(&mut self, id: EntityId) {
        assert!(
            id.index() < self.records.len(),
            "entity id {id} outside table capacity {}",
            self.capacity
        );
        if !self.records[id.index()].alive {
            warn!(entity = %id, "attempted to destroy an already-dead entity; ignoring");
            return;
        }
        let columns: Vec<(ColumnTypeId, SlotId)> = self.records[id.index()].columns.iter().collect();
        for (column, slot) in columns {
            self.containers[column.0 as usize].clear_slot(slot);
        }
        let record = &mut self.records[id.index()];
        record.columns.clear();
        record.alive = false;
    }

    // -- column attachment & access -----------------------------------------

    /// Allocate a slot in `T`'s container, write `value`, and map it into
    /// the entity's column table.
    ///
    /// # Panics
    ///
    /// Panics when `T` was never registered, the container is out of slots,
    /// or the entity already owns a slot of this type; all configuration
    /// errors, not runtime conditions.
    pub fn attach<T: ColumnData>(&mut self, id: EntityId, value: T) {
        debug_assert!(self.is_alive(id), "attaching column to dead entity {id}");
        let column = self
            .registry
            .lookup::<T>()
            .unwrap_or_else(|| panic!("column type {} not registered", std::any::type_name::<T>()));
        let slot = self.column_mut::<T>().allocate(value);
        self.records[id.index()].columns.insert(column, slot);
    }

    /// The slot `id` owns for `column`, if any.
    pub fn slot_of(&self, id: EntityId, column: ColumnTypeId) -> Option<SlotId> {
        let record = self.records.get(id.index())?;
        if !record.alive {
            return None;
        }
        record.columns.get(column)
    }

    /// Typed variant of [`slot_of`](Self::slot_of).
    pub fn slot_for<T: ColumnData>(&self, id: EntityId) -> Option<SlotId> {
        self.slot_of(id, self.registry.lookup::<T>()?)
    }

    /// Shared access to `T`'s container.
    ///
    /// # Panics
    ///
    /// Panics when `T` was never registered.
    pub fn column<T: ColumnData>(&self) -> &Column<T> {
        let id = self
            .registry
            .lookup::<T>()
            .unwrap_or_else(|| panic!("column type {} not registered", std::any::type_name::<T>()));
        self.containers[id.0 as usize]
            .as_any()
            .downcast_ref::<Column<T>>()
            .expect("container type matches registry entry")
    }

    /// Exclusive access to `T`'s container.
    pub fn column_mut<T: ColumnData>(&mut self) -> &mut Column<T> {
        let id = self
            .registry
            .lookup::<T>()
            .unwrap_or_else(|| panic!("column type {} not registered", std::any::type_name::<T>()));
        self.containers[id.0 as usize]
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .expect("container type matches registry entry")
    }

    /// Read the current value of `T` for an entity, when it owns one.
    pub fn value<T: ColumnData>(&self, id: EntityId) -> Option<&T> {
        let slot = self.slot_for::<T>(id)?;
        Some(self.column::<T>().get(slot))
    }

    /// Copy out the current value of `T` for an entity.
    pub fn value_copied<T: ColumnData + Copy>(&self, id: EntityId) -> Option<T> {
        self.value::<T>(id).copied()
    }

    /// Overwrite the value of `T` for an entity. Returns `false` (and does
    /// nothing) when the entity does not own that column.
    pub fn set_value<T: ColumnData>(&mut self, id: EntityId, value: T) -> bool {
        match self.slot_for::<T>(id) {
            Some(slot) => {
                self.column_mut::<T>().set(slot, value);
                true
            }
            None => false,
        }
    }

    // -- request queues -----------------------------------------------------

    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.spawn_requests.push_back(request);
    }

    pub fn request_destroy(&mut self, id: EntityId) {
        self.destroy_requests.push_back(id);
    }

    pub fn take_spawn_request(&mut self) -> Option<SpawnRequest> {
        self.spawn_requests.pop_front()
    }

    pub fn take_destroy_request(&mut self) -> Option<EntityId> {
        self.destroy_requests.pop_front()
    }

    pub fn pending_spawns(&self) -> usize {
        self.spawn_requests.len()
    }

    pub fn pending_destroys(&self) -> usize {
        self.destroy_requests.len()
    }

    // -- data-change events -------------------------------------------------

    /// Apply an incoming data-change event.
    ///
    /// Each affected entity that owns a slot of the event's column receives
    /// the payload value; entities lacking the column are skipped with a
    /// warning. Returns `true` when the event was accepted (payload decoded
    /// and written to the resolved slots); the authoritative side re-emits
    /// accepted events for replication.
    pub fn apply_data_change(&mut self, event: &DataChangeEvent) -> bool {
        let Some(info) = self.registry.info(event.column) else {
            warn!(column = ?event.column, "dropping data-change event for unregistered column");
            return false;
        };
        let column_name = info.name;

        let mut slots = Vec::with_capacity(event.entities.len());
        for &entity in &event.entities {
            match self.slot_of(entity, event.column) {
                Some(slot) => slots.push(slot),
                None => {
                    warn!(
                        entity = %entity,
                        column = column_name,
                        "data-change event targets an entity without that column; skipping it"
                    );
                }
            }
        }

        self.containers[event.column.0 as usize].apply_raw(&event.payload, &slots)
    }

    // -- state digest -------------------------------------------------------

    /// Blake3 hex digest over the full store state: alive flags, per-entity
    /// column maps, and every container's data array. Two stores fed the
    /// same inputs digest identically; any divergence shows up here.
    pub fn state_digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            hasher.update(&[record.alive as u8]);
            for (column, slot) in record.columns.iter() {
                hasher.update(&[column.0]);
                hasher.update(&slot.0.to_le_bytes());
            }
        }
        for container in &self.containers {
            container.digest_into(&mut hasher);
        }
        hasher.finalize().to_hex().to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
