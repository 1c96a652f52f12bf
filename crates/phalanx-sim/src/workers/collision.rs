//! Ground-unit collision pushback.

use tracing::trace;

use phalanx_store::entity::EntityId;
use phalanx_store::position::Position;

use crate::columns::{GroundCollision, Transform};
use crate::worker::{MatchData, Worker};

const PUSHBACK_FORCE_MULTIPLIER: f32 = 5.0;

struct Collider {
    id: EntityId,
    collision: GroundCollision,
    position: Position,
}

/// Pushes overlapping colliders apart.
///
/// The collision world is snapshotted in `pre_work`, so every unit this
/// tick reacts to where things stood at the start of the pass rather than
/// to pushes applied earlier in the same scan.
#[derive(Default)]
pub struct CollisionWorker {
    world: Vec<Collider>,
}

impl CollisionWorker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Worker for CollisionWorker {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn pre_work(&mut self, _dt: f32, data: &mut MatchData) {
        self.world.clear();
        let ids: Vec<EntityId> = data.store.live_entities().collect();
        for id in ids {
            let collision = data.store.value_copied::<GroundCollision>(id);
            let transform = data.store.value_copied::<Transform>(id);
            if let (Some(collision), Some(transform)) = (collision, transform) {
                self.world.push(Collider {
                    id,
                    collision,
                    position: transform.position,
                });
            }
        }
        trace!(colliders = self.world.len(), "collision world rebuilt");
    }

    fn run_on_entity(&mut self, dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(collision) = data.store.value_copied::<GroundCollision>(id) else {
            return;
        };
        let Some(mut transform) = data.store.value_copied::<Transform>(id) else {
            return;
        };
        if !collision.allow_pushback {
            return;
        }

        let mut push = Position::ZERO;
        let mut touched = false;
        for other in &self.world {
            if other.id == id {
                continue;
            }
            let squared_dist = transform.position.squared_distance(other.position);
            let reach = collision.radius + other.collision.radius;
            // Coincident positions have no direction to push along.
            if squared_dist < reach * reach && squared_dist > f32::EPSILON {
                push += (transform.position - other.position).normalized() * (1.0 / squared_dist);
                touched = true;
            }
        }

        if touched {
            transform.position += push * (dt * PUSHBACK_FORCE_MULTIPLIER);
            data.store.set_value(id, transform);
        }
    }
}
