//! Typed fixed-capacity data containers ("columns").
//!
//! A [`Column<T>`] owns one dense array of `T` with `capacity` slots and a
//! free-slot list. Every living entity that carries this column type owns
//! exactly one slot; the slot returns to the free list when the entity dies.
//!
//! Slot ids are **not** stable identities across an entity's death and a
//! later spawn: always resolve them through the entity table each tick.
//! The order in which freed slots are reused is deliberately unspecified.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// SlotId
// ---------------------------------------------------------------------------

/// Index of one slot inside a column's data array.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl SlotId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ColumnData
// ---------------------------------------------------------------------------

/// Bounds every column value type must satisfy.
///
/// `Default` is what a cleared slot resets to; serde powers event payloads
/// and the state digest.
pub trait ColumnData:
    Clone + Default + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> ColumnData for T where
    T: Clone + Default + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Dense fixed-capacity storage for one column type.
pub struct Column<T: ColumnData> {
    name: &'static str,
    data: Vec<T>,
    free: VecDeque<SlotId>,
}

impl<T: ColumnData> Column<T> {
    pub fn new(name: &'static str, capacity: u32) -> Self {
        let mut data = Vec::with_capacity(capacity as usize);
        data.resize_with(capacity as usize, T::default);
        let free = (0..capacity).map(SlotId).collect();
        Self { name, data, free }
    }

    /// Take a free slot and write `value` into it.
    ///
    /// # Panics
    ///
    /// Panics when the free list is empty. Running out of column slots means
    /// the match was sized incorrectly at configuration time; it is not a
    /// recoverable runtime condition.
    pub fn allocate(&mut self, value: T) -> SlotId {
        let slot = self
            .free
            .pop_front()
            .unwrap_or_else(|| panic!("column '{}' out of slots: max entity count undersized", self.name));
        self.data[slot.index()] = value;
        slot
    }

    /// Reset `slot` to the default value and return it to the free list.
    /// Callers must not read the slot afterward and must not clear twice.
    pub fn clear(&mut self, slot: SlotId) {
        self.data[slot.index()] = T::default();
        self.free.push_back(slot);
    }

    #[inline]
    pub fn get(&self, slot: SlotId) -> &T {
        &self.data[slot.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: SlotId) -> &mut T {
        &mut self.data[slot.index()]
    }

    #[inline]
    pub fn set(&mut self, slot: SlotId, value: T) {
        self.data[slot.index()] = value;
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ---------------------------------------------------------------------------
// AnyColumn
// ---------------------------------------------------------------------------

/// Type-erased surface of a [`Column<T>`], used by the entity table to
/// address containers by [`ColumnTypeId`](crate::registry::ColumnTypeId)
/// without knowing the value type.
pub trait AnyColumn: Send + Sync {
    /// Column name as registered.
    fn name(&self) -> &'static str;

    /// Clear one slot back to default and free it.
    fn clear_slot(&mut self, slot: SlotId);

    /// Apply a raw data-change payload (canonical JSON bytes of one value of
    /// this column's type) to every listed slot. Returns `true` when the
    /// payload decoded and the change was accepted.
    fn apply_raw(&mut self, payload: &[u8], slots: &[SlotId]) -> bool;

    /// Feed this column's full data array into a state digest.
    fn digest_into(&self, hasher: &mut blake3::Hasher);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ColumnData> AnyColumn for Column<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn clear_slot(&mut self, slot: SlotId) {
        self.clear(slot);
    }

    fn apply_raw(&mut self, payload: &[u8], slots: &[SlotId]) -> bool {
        let value: T = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    column = self.name,
                    error = %e,
                    "rejecting data-change event: payload does not decode as this column's type"
                );
                return false;
            }
        };
        for &slot in slots {
            self.data[slot.index()] = value.clone();
        }
        true
    }

    fn digest_into(&self, hasher: &mut blake3::Hasher) {
        let bytes = serde_json::to_vec(&self.data)
            .expect("column data should always be JSON-serializable");
        hasher.update(self.name.as_bytes());
        hasher.update(&bytes);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Hp(i32);

    #[test]
    fn allocate_writes_value() {
        let mut col = Column::<Hp>::new("health", 4);
        let slot = col.allocate(Hp(50));
        assert_eq!(col.get(slot), &Hp(50));
        assert_eq!(col.free_slots(), 3);
    }

    #[test]
    fn clear_resets_to_default_and_frees() {
        let mut col = Column::<Hp>::new("health", 2);
        let slot = col.allocate(Hp(99));
        col.clear(slot);
        assert_eq!(col.get(slot), &Hp::default());
        assert_eq!(col.free_slots(), 2);
    }

    #[test]
    fn freed_slot_is_eventually_reused() {
        // The reuse *order* is unspecified; only reuse itself is guaranteed.
        let mut col = Column::<Hp>::new("health", 2);
        let a = col.allocate(Hp(1));
        let b = col.allocate(Hp(2));
        col.clear(a);
        let c = col.allocate(Hp(3));
        assert!(c == a || c == b);
        assert_eq!(col.free_slots(), 0);
    }

    #[test]
    #[should_panic(expected = "out of slots")]
    fn exhausting_free_list_panics() {
        let mut col = Column::<Hp>::new("health", 1);
        col.allocate(Hp(1));
        col.allocate(Hp(2));
    }

    #[test]
    fn apply_raw_accepts_valid_payload() {
        let mut col = Column::<Hp>::new("health", 4);
        let a = col.allocate(Hp(1));
        let b = col.allocate(Hp(2));
        let payload = serde_json::to_vec(&Hp(77)).unwrap();
        assert!(col.apply_raw(&payload, &[a, b]));
        assert_eq!(col.get(a), &Hp(77));
        assert_eq!(col.get(b), &Hp(77));
    }

    #[test]
    fn apply_raw_rejects_garbage_payload() {
        let mut col = Column::<Hp>::new("health", 1);
        let a = col.allocate(Hp(1));
        assert!(!col.apply_raw(b"not json", &[a]));
        assert_eq!(col.get(a), &Hp(1));
    }

    #[test]
    fn digest_changes_with_data() {
        let mut col = Column::<Hp>::new("health", 2);
        let mut h1 = blake3::Hasher::new();
        col.digest_into(&mut h1);
        col.allocate(Hp(5));
        let mut h2 = blake3::Hasher::new();
        col.digest_into(&mut h2);
        assert_ne!(h1.finalize(), h2.finalize());
    }
}
