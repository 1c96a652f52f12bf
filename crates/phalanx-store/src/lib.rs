//! Phalanx store -- fixed-capacity entity table with typed columns.
//!
//! This crate provides the data layer of the Phalanx simulation core.
//! Entities are dense indices into a fixed-size table; each registered
//! column type owns one preallocated container, and per-entity records map
//! column type ids to the slot that entity owns. All memory is allocated up
//! front at match start, so a running match never grows.
//!
//! # Quick Start
//!
//! ```
//! use phalanx_store::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Health { hp: i32 }
//!
//! let mut registry = ColumnRegistry::new();
//! registry.register::<Health>("health");
//! let mut store = EntityStore::new(16, registry);
//!
//! let entity = store.spawn_empty().unwrap();
//! store.attach(entity, Health { hp: 100 });
//!
//! assert_eq!(store.value_copied::<Health>(entity), Some(Health { hp: 100 }));
//! ```

#![deny(unsafe_code)]

pub mod archetype;
pub mod column;
pub mod entity;
pub mod event;
pub mod position;
pub mod registry;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Every id in the entity table is alive. Recoverable: the caller logs
    /// and drops the spawn.
    #[error("entity table full ({capacity} entities); dropping spawn")]
    TableFull { capacity: u32 },

    /// A column type was referenced that has not been registered.
    #[error("column type '{name}' not registered")]
    UnknownColumn { name: String },

    /// A data-change payload did not decode as the column's value type.
    #[error("payload for column {column:?} failed to decode: {details}")]
    PayloadDecode {
        column: registry::ColumnTypeId,
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Common imports for store users.
pub mod prelude {
    pub use crate::archetype::Archetype;
    pub use crate::column::{Column, ColumnData, SlotId};
    pub use crate::entity::{EntityId, EntityRecord, MAX_COLUMNS_PER_ENTITY};
    pub use crate::event::{DataChangeEvent, PlayerId};
    pub use crate::position::Position;
    pub use crate::registry::{ColumnRegistry, ColumnTypeId};
    pub use crate::store::{EntityStore, SpawnRequest};
    pub use crate::StoreError;
}
