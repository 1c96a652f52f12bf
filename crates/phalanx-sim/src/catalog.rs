//! The object-type catalog: what kinds of objects a match can spawn.
//!
//! Each entry pairs a name with the archetype attached at spawn time. The
//! catalog index doubles as the [`ObjectTypeId`] carried by spawn requests,
//! so the catalog must be built identically on both sides of a replicated
//! match.

use serde::{Deserialize, Serialize};
use tracing::warn;

use phalanx_store::archetype::Archetype;
use phalanx_store::entity::EntityId;
use phalanx_store::registry::ColumnRegistry;
use phalanx_store::store::{EntityStore, SpawnRequest};
use phalanx_store::StoreError;

use crate::columns::{
    Ai, CellTag, GroundCollision, Health, Movement, ObjectKind, OwnerTag, PeriodicSpawner,
    Transform, Weapon,
};

// ---------------------------------------------------------------------------
// ObjectTypeId
// ---------------------------------------------------------------------------

/// Index into the match's object-type catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ObjectTypeId(pub u16);

/// Catalog slot of the basic combat unit in [`standard_catalog`].
pub const GRUNT: ObjectTypeId = ObjectTypeId(0);
/// Catalog slot of the unit-producing building in [`standard_catalog`].
pub const BARRACKS: ObjectTypeId = ObjectTypeId(1);

// ---------------------------------------------------------------------------
// ObjectCatalog
// ---------------------------------------------------------------------------

struct ObjectTypeDef {
    name: &'static str,
    archetype: Archetype,
}

/// Ordered collection of spawnable object types.
pub struct ObjectCatalog {
    types: Vec<ObjectTypeDef>,
}

impl ObjectCatalog {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    pub fn add(&mut self, name: &'static str, archetype: Archetype) -> ObjectTypeId {
        let id = ObjectTypeId(self.types.len() as u16);
        self.types.push(ObjectTypeDef { name, archetype });
        id
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn name_of(&self, id: ObjectTypeId) -> Option<&'static str> {
        self.types.get(id.0 as usize).map(|t| t.name)
    }

    pub fn resolve_name(&self, name: &str) -> Option<ObjectTypeId> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .map(|i| ObjectTypeId(i as u16))
    }

    /// Spawn one object from a request: attach the type's archetype, then
    /// overwrite position and owner from the request.
    ///
    /// A request naming an unknown type is dropped with a warning; a full
    /// table propagates as [`StoreError::TableFull`].
    pub fn spawn(
        &self,
        store: &mut EntityStore,
        request: &SpawnRequest,
    ) -> Result<Option<EntityId>, StoreError> {
        let Some(def) = self.types.get(request.object_type as usize) else {
            warn!(
                object_type = request.object_type,
                "dropping spawn request for unknown object type"
            );
            return Ok(None);
        };
        let id = store.spawn_with_archetype(&def.archetype)?;
        store.set_value(
            id,
            Transform {
                position: request.position,
            },
        );
        store.set_value(
            id,
            OwnerTag {
                player: request.owner,
            },
        );
        Ok(Some(id))
    }
}

impl Default for ObjectCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Standard catalog
// ---------------------------------------------------------------------------

/// Hit points of a freshly spawned grunt.
pub const GRUNT_HP: i32 = 100;
/// Weapon range of a grunt, in world units.
pub const GRUNT_WEAPON_RANGE: f32 = 2.0;
/// Seconds between units produced by a barracks.
pub const BARRACKS_SPAWN_COOLDOWN: f32 = 10.0;

/// Build the catalog both match sides use: a mobile fighting unit and a
/// stationary building that produces them.
pub fn standard_catalog(registry: &ColumnRegistry) -> ObjectCatalog {
    let mut catalog = ObjectCatalog::new();

    let grunt = Archetype::new("grunt")
        .with(registry, Transform::default())
        .with(registry, Movement::default())
        .with(registry, Health { hp: GRUNT_HP })
        .with(
            registry,
            Weapon {
                cooldown: 0.0,
                windup: 0.0,
                in_use: false,
                range: GRUNT_WEAPON_RANGE,
            },
        )
        .with(registry, Ai::default())
        .with(registry, OwnerTag::default())
        .with(registry, CellTag::default())
        .with(
            registry,
            GroundCollision {
                radius: 0.5,
                allow_pushback: true,
            },
        )
        .with(registry, ObjectKind { type_id: GRUNT });
    catalog.add("grunt", grunt);

    let barracks = Archetype::new("barracks")
        .with(registry, Transform::default())
        .with(registry, Health { hp: 200 })
        .with(registry, OwnerTag::default())
        .with(registry, CellTag::default())
        .with(
            registry,
            PeriodicSpawner {
                object_type: GRUNT,
                clock: BARRACKS_SPAWN_COOLDOWN,
                cooldown: BARRACKS_SPAWN_COOLDOWN,
            },
        )
        .with(
            registry,
            GroundCollision {
                radius: 1.5,
                allow_pushback: false,
            },
        )
        .with(registry, ObjectKind { type_id: BARRACKS });
    catalog.add("barracks", barracks);

    catalog
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
