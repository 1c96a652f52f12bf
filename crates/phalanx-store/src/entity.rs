//! Entity identifiers and per-entity records.
//!
//! An [`EntityId`] is a dense index into the entity table, in
//! `[0, max_entities)`. Ids are deliberately *not* generational: a destroyed
//! entity's id is reused by a later spawn, and every consumer is expected to
//! go through the `EntityId -> ColumnTypeId -> SlotId` indirection each tick
//! rather than caching slot ids across deaths.
//!
//! Each [`EntityRecord`] holds the alive flag and a small fixed-size
//! [`ColumnMap`] from column type id to the slot that entity owns in the
//! matching container.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::column::SlotId;
use crate::registry::ColumnTypeId;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Dense entity identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Sentinel for "no entity", used in the grid's shared id array.
    pub const EMPTY: EntityId = EntityId(u32::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == EntityId::EMPTY {
            write!(f, "EntityId(EMPTY)")
        } else {
            write!(f, "EntityId({})", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ColumnMap
// ---------------------------------------------------------------------------

/// Maximum number of distinct column types a single entity can own.
pub const MAX_COLUMNS_PER_ENTITY: usize = 16;

const NO_TYPE: u8 = u8::MAX;
const NO_SLOT: u32 = u32::MAX;

/// Fixed-size mapping from column type id to owned slot id.
///
/// Entries are stored in two parallel arrays with `u8::MAX` / `u32::MAX`
/// sentinels so a cleared record carries no stale ownership.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    types: [u8; MAX_COLUMNS_PER_ENTITY],
    slots: [u32; MAX_COLUMNS_PER_ENTITY],
}

impl ColumnMap {
    pub fn new() -> Self {
        Self {
            types: [NO_TYPE; MAX_COLUMNS_PER_ENTITY],
            slots: [NO_SLOT; MAX_COLUMNS_PER_ENTITY],
        }
    }

    /// Record that this entity owns `slot` in the container for `column`.
    ///
    /// # Panics
    ///
    /// Panics when all entries are taken or the column is already mapped:
    /// both indicate an archetype configured beyond the fixed table size,
    /// a sizing mistake rather than a runtime condition.
    pub fn insert(&mut self, column: ColumnTypeId, slot: SlotId) {
        assert!(
            self.get(column).is_none(),
            "entity already owns a slot for column {column:?}"
        );
        for i in 0..MAX_COLUMNS_PER_ENTITY {
            if self.types[i] == NO_TYPE {
                self.types[i] = column.0;
                self.slots[i] = slot.0;
                return;
            }
        }
        panic!("entity column table full ({MAX_COLUMNS_PER_ENTITY} entries): archetype carries too many column types");
    }

    /// The slot this entity owns for `column`, if any.
    pub fn get(&self, column: ColumnTypeId) -> Option<SlotId> {
        for i in 0..MAX_COLUMNS_PER_ENTITY {
            if self.types[i] == column.0 {
                return Some(SlotId(self.slots[i]));
            }
        }
        None
    }

    /// Iterate over all `(column, slot)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnTypeId, SlotId)> + '_ {
        (0..MAX_COLUMNS_PER_ENTITY)
            .take_while(|&i| self.types[i] != NO_TYPE)
            .map(|i| (ColumnTypeId(self.types[i]), SlotId(self.slots[i])))
    }

    pub fn clear(&mut self) {
        self.types = [NO_TYPE; MAX_COLUMNS_PER_ENTITY];
        self.slots = [NO_SLOT; MAX_COLUMNS_PER_ENTITY];
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.types[0] == NO_TYPE
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// One row of the entity table.
///
/// Invariant: a dead record holds no column slots (the map is cleared when
/// the entity is destroyed, after its slots are released).
#[derive(Debug, Clone, Copy)]
pub struct EntityRecord {
    pub alive: bool,
    pub columns: ColumnMap,
}

impl EntityRecord {
    pub fn dead() -> Self {
        Self {
            alive: false,
            columns: ColumnMap::new(),
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
    fn insert_and_get() {
        let mut map = ColumnMap::new();
        map.insert(ColumnTypeId(0), SlotId(7));
        map.insert(ColumnTypeId(3), SlotId(11));
        assert_eq!(map.get(ColumnTypeId(0)), Some(SlotId(7)));
        assert_eq!(map.get(ColumnTypeId(3)), Some(SlotId(11)));
        assert_eq!(map.get(ColumnTypeId(1)), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn clear_removes_all_entries() {
        let mut map = ColumnMap::new();
        map.insert(ColumnTypeId(2), SlotId(5));
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.get(ColumnTypeId(2)), None);
    }

    #[test]
    #[should_panic(expected = "column table full")]
    fn overflowing_the_table_panics() {
        let mut map = ColumnMap::new();
        for i in 0..=MAX_COLUMNS_PER_ENTITY {
            map.insert(ColumnTypeId(i as u8), SlotId(i as u32));
        }
    }

    #[test]
    #[should_panic(expected = "already owns a slot")]
    fn double_insert_same_column_panics() {
        let mut map = ColumnMap::new();
        map.insert(ColumnTypeId(1), SlotId(0));
        map.insert(ColumnTypeId(1), SlotId(1));
    }

    #[test]
    fn entity_id_sentinel_debug() {
        assert_eq!(format!("{:?}", EntityId::EMPTY), "EntityId(EMPTY)");
        assert_eq!(format!("{:?}", EntityId(4)), "EntityId(4)");
    }
}
