//! Order-driven movement: goal setting, integration, arrival.

use phalanx_store::entity::EntityId;
use phalanx_store::position::Position;

use crate::columns::{Ai, Movement, Order, Transform, Weapon, UNIT_SPEED};
use crate::worker::{MatchData, Worker};

/// Remaining travel below this is treated as arrived.
const MOVE_VECTOR_EPSILON: f32 = 0.01;

/// Squared distance to a move goal under which the order is complete.
const ARRIVAL_SQUARED_DISTANCE: f32 = 0.1;

/// Hysteresis subtracted from the chase range while already moving, so a
/// pursuer does not flicker between chasing and stopping at the boundary.
const CHASE_RANGE_SLACK: f32 = 0.1;

// ---------------------------------------------------------------------------
// OrderMovementWorker
// ---------------------------------------------------------------------------

/// Reads each unit's order and sets or clears its movement goal.
#[derive(Default)]
pub struct OrderMovementWorker;

impl OrderMovementWorker {
    pub fn new() -> Self {
        Self
    }
}

impl Worker for OrderMovementWorker {
    fn name(&self) -> &'static str {
        "order_movement"
    }

    fn run_on_entity(&mut self, _dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(ai) = data.store.value_copied::<Ai>(id) else {
            return;
        };
        let Some(mut movement) = data.store.value_copied::<Movement>(id) else {
            return;
        };
        let Some(transform) = data.store.value_copied::<Transform>(id) else {
            return;
        };
        let my_position = transform.position;

        match ai.order {
            Order::MoveTo(target) => movement.set_target(target, my_position),
            Order::AttackTarget(order) => {
                let Some(weapon) = data.store.value_copied::<Weapon>(id) else {
                    return;
                };
                let Some(target_transform) = data.store.value_copied::<Transform>(order.target)
                else {
                    return;
                };
                let squared_dist = target_transform.position.squared_distance(my_position);
                let squared_range = weapon.range * weapon.range;
                let chase = if movement.moving() {
                    squared_dist >= squared_range - CHASE_RANGE_SLACK
                } else {
                    squared_dist >= squared_range
                };
                if chase {
                    movement.set_target(target_transform.position, my_position);
                } else {
                    movement.stop();
                }
            }
            Order::None | Order::HoldPosition => {
                if movement.moving() {
                    movement.stop();
                }
            }
        }

        data.store.set_value(id, movement);
    }
}

// ---------------------------------------------------------------------------
// MovementWorker
// ---------------------------------------------------------------------------

/// Advances every moving unit along its cached direction and shrinks the
/// remaining travel vector, snapping it to zero near the goal.
#[derive(Default)]
pub struct MovementWorker;

impl MovementWorker {
    pub fn new() -> Self {
        Self
    }
}

impl Worker for MovementWorker {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn run_on_entity(&mut self, dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(mut movement) = data.store.value_copied::<Movement>(id) else {
            return;
        };
        let Some(mut transform) = data.store.value_copied::<Transform>(id) else {
            return;
        };
        if !movement.moving() {
            return;
        }

        let step = movement.normalized * (UNIT_SPEED * dt);
        transform.position += step;
        movement.vector -= step;

        if movement.vector.approx_eq(Position::ZERO, MOVE_VECTOR_EPSILON) {
            movement.vector = Position::ZERO;
            movement.normalized = Position::ZERO;
        }

        data.store.set_value(id, transform);
        data.store.set_value(id, movement);
    }
}

// ---------------------------------------------------------------------------
// ArrivalWorker
// ---------------------------------------------------------------------------

/// Clears a move order once the unit stands close enough to its goal.
#[derive(Default)]
pub struct ArrivalWorker;

impl ArrivalWorker {
    pub fn new() -> Self {
        Self
    }
}

impl Worker for ArrivalWorker {
    fn name(&self) -> &'static str {
        "arrival"
    }

    fn run_on_entity(&mut self, _dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(transform) = data.store.value_copied::<Transform>(id) else {
            return;
        };
        let Some(mut ai) = data.store.value_copied::<Ai>(id) else {
            return;
        };

        if let Order::MoveTo(target) = ai.order {
            if transform.position.squared_distance(target) < ARRIVAL_SQUARED_DISTANCE {
                ai.order = Order::None;
                data.store.set_value(id, ai);
            }
        }
    }
}
