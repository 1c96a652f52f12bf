//! Data-change events.
//!
//! A [`DataChangeEvent`] names one column type, a set of affected entities,
//! and a raw payload holding one serialized value of that column's type. The
//! same shape flows in both directions: incoming events (from the transport
//! layer) are applied to the store, and accepted events on an authoritative
//! match are re-emitted for replication. Byte-level message framing is the
//! transport's concern, not ours.

use serde::{Deserialize, Serialize};

use crate::column::ColumnData;
use crate::entity::EntityId;
use crate::registry::{ColumnRegistry, ColumnTypeId};
use crate::StoreError;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// Identifier of a connected player, as assigned by matchmaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub i32);

// ---------------------------------------------------------------------------
// DataChangeEvent
// ---------------------------------------------------------------------------

/// A replicated change to one column's value on a set of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChangeEvent {
    /// Which column type the payload targets.
    pub column: ColumnTypeId,
    /// Seconds since match start at the moment the event originated.
    /// Carried opaque; the core never branches on it.
    pub timestamp: f32,
    /// The player whose action originated the change.
    pub origin_player: PlayerId,
    /// Entities whose slot (if owned) receives the new value.
    pub entities: Vec<EntityId>,
    /// Canonical JSON bytes of one value of the column's type.
    pub payload: Vec<u8>,
}

impl DataChangeEvent {
    /// Build an event carrying `value` for every entity in `entities`.
    ///
    /// Fails when `T` is not a registered column type.
    pub fn new<T: ColumnData>(
        registry: &ColumnRegistry,
        value: &T,
        entities: Vec<EntityId>,
        timestamp: f32,
        origin_player: PlayerId,
    ) -> Result<Self, StoreError> {
        let column = registry
            .lookup::<T>()
            .ok_or_else(|| StoreError::UnknownColumn {
                name: std::any::type_name::<T>().to_owned(),
            })?;
        let payload =
            serde_json::to_vec(value).expect("column values should always be JSON-serializable");
        Ok(Self {
            column,
            timestamp,
            origin_player,
            entities,
            payload,
        })
    }

    /// Decode the payload back into the typed value.
    pub fn decode<T: ColumnData>(&self) -> Result<T, StoreError> {
        serde_json::from_slice(&self.payload).map_err(|e| StoreError::PayloadDecode {
            column: self.column,
            details: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
