//! The standard column types of a match.
//!
//! Registration order in [`register_standard_columns`] fixes the wire ids
//! used by data-change events; both sides of a replicated match must call it
//! (and nothing else) before building their stores.

use serde::{Deserialize, Serialize};

use phalanx_grid::cell::CellCoords;
use phalanx_store::entity::EntityId;
use phalanx_store::event::PlayerId;
use phalanx_store::position::Position;
use phalanx_store::registry::ColumnRegistry;

use crate::catalog::ObjectTypeId;

// ---------------------------------------------------------------------------
// Transform & Movement
// ---------------------------------------------------------------------------

/// World position of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Position,
}

/// Units per second every mobile unit moves at.
pub const UNIT_SPEED: f32 = 2.0;

/// Remaining travel of a moving unit, as a vector toward its goal.
///
/// `vector` shrinks as the unit advances; the unit counts as moving while it
/// is nonzero. `normalized` caches the direction so integration does not
/// renormalize every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub vector: Position,
    pub normalized: Position,
}

impl Movement {
    pub fn moving(&self) -> bool {
        self.vector != Position::ZERO
    }

    pub fn set_target(&mut self, target: Position, current: Position) {
        self.vector = target - current;
        self.normalized = self.vector.normalized();
    }

    pub fn stop(&mut self) {
        self.vector = Position::ZERO;
        self.normalized = Position::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Health & Weapon
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub hp: i32,
}

/// Seconds between attacks.
pub const WEAPON_COOLDOWN: f32 = 1.0;
/// Seconds a unit winds up before its attack lands.
pub const WEAPON_WINDUP: f32 = 0.2;
/// Hit points removed per landed attack.
pub const WEAPON_DAMAGE: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub cooldown: f32,
    pub windup: f32,
    /// True while the unit is winding up to attack.
    pub in_use: bool,
    pub range: f32,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Parameters of an attack-target order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub target: EntityId,
    /// Player-issued attacks are forced; auto-acquired ones are not and may
    /// be replaced by a closer target.
    pub forced: bool,
    /// Set by targeting each tick: target currently within weapon range.
    pub can_attack: bool,
    /// Whether targeting should keep re-evaluating this target.
    pub seek: bool,
}

impl Default for AttackOrder {
    fn default() -> Self {
        Self {
            target: EntityId::EMPTY,
            forced: false,
            can_attack: false,
            seek: false,
        }
    }
}

/// What an entity is currently trying to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Order {
    #[default]
    None,
    MoveTo(Position),
    /// Stand at the current position; do not move or auto-acquire targets.
    HoldPosition,
    AttackTarget(AttackOrder),
}

/// The order an entity currently follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub order: Order,
}

// ---------------------------------------------------------------------------
// Ownership & grid placement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTag {
    pub player: PlayerId,
}

/// Which grid cell an entity currently occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTag {
    pub coords: CellCoords,
    /// False until the grid worker places the entity for the first time.
    pub placed: bool,
}

// ---------------------------------------------------------------------------
// Production & collision
// ---------------------------------------------------------------------------

/// Spawns one object of `object_type` every `cooldown` seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodicSpawner {
    pub object_type: ObjectTypeId,
    /// Seconds until the next spawn; reset to `cooldown` when it elapses.
    pub clock: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundCollision {
    pub radius: f32,
    /// Immovable objects (buildings) set this false.
    pub allow_pushback: bool,
}

/// Which catalog entry an entity was spawned from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectKind {
    pub type_id: ObjectTypeId,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every standard column type, fixing the wire id order.
pub fn register_standard_columns(registry: &mut ColumnRegistry) {
    registry.register::<Movement>("movement");
    registry.register::<Transform>("transform");
    registry.register::<Health>("health");
    registry.register::<Weapon>("weapon");
    registry.register::<Ai>("ai");
    registry.register::<OwnerTag>("owner");
    registry.register::<CellTag>("cell_coords");
    registry.register::<PeriodicSpawner>("periodic_spawner");
    registry.register::<GroundCollision>("ground_collision");
    registry.register::<ObjectKind>("object_kind");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_target_and_stop() {
        let mut movement = Movement::default();
        assert!(!movement.moving());

        movement.set_target(Position::new(3.0, 0.0, 4.0), Position::ZERO);
        assert!(movement.moving());
        assert!(movement
            .normalized
            .approx_eq(Position::new(0.6, 0.0, 0.8), 1e-5));

        movement.stop();
        assert!(!movement.moving());
    }

    #[test]
    fn registration_order_is_stable() {
        let mut registry = ColumnRegistry::new();
        register_standard_columns(&mut registry);
        assert_eq!(registry.lookup_by_name("movement").unwrap().0, 0);
        assert_eq!(registry.lookup_by_name("transform").unwrap().0, 1);
        assert_eq!(registry.lookup_by_name("object_kind").unwrap().0, 9);
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn default_order_is_none() {
        assert_eq!(Ai::default().order, Order::None);
    }
}
