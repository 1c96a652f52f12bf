//! Phalanx sim -- deterministic real-time-strategy simulation core.
//!
//! A [`orchestrator::Match`] owns a fixed-capacity entity store, a spatial
//! partition grid over it, and a pipeline of per-tick workers that move
//! units, resolve combat, produce new units and keep the grid in sync.
//! Everything is allocated up front and every tick is a pure function of
//! the inputs so far, so an authoritative server instance and any number
//! of mirror instances fed the same requests and events stay bit-identical
//! (verified via [`orchestrator::Match::state_digest`]).
//!
//! # Quick Start
//!
//! ```
//! use phalanx_sim::prelude::*;
//!
//! let mut game = Match::new(MatchConfig::default());
//! game.start(&[SpawnRequest {
//!     object_type: GRUNT.0,
//!     owner: PlayerId(1),
//!     position: Position::new(10.0, 0.0, 10.0),
//! }]);
//!
//! let report = game.tick(0.05);
//! assert_eq!(report.spawned.len(), 1);
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod columns;
pub mod orchestrator;
pub mod spatial;
pub mod worker;
pub mod workers;

/// Common imports for running matches.
pub mod prelude {
    pub use crate::catalog::{ObjectCatalog, ObjectTypeId, BARRACKS, GRUNT};
    pub use crate::columns::{
        Ai, AttackOrder, CellTag, GroundCollision, Health, Movement, ObjectKind, Order, OwnerTag,
        PeriodicSpawner, Transform, Weapon,
    };
    pub use crate::orchestrator::{Match, MatchConfig, MatchState, TickReport};
    pub use crate::spatial::SpatialIndex;
    pub use crate::worker::{MatchData, Worker};
    pub use phalanx_store::entity::EntityId;
    pub use phalanx_store::event::{DataChangeEvent, PlayerId};
    pub use phalanx_store::position::Position;
    pub use phalanx_store::store::SpawnRequest;
}
