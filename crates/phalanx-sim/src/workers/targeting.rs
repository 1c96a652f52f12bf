//! Target acquisition and validation.

use phalanx_store::entity::EntityId;

use crate::columns::{Ai, AttackOrder, CellTag, Order, OwnerTag, Transform, Weapon};
use crate::worker::{MatchData, Worker};

/// Widest ring of cells searched for targets around a unit's own cell.
const MAX_SEARCH_RANGE: i32 = 5;

/// Updates each armed unit's order: drops orders on dead targets, scans
/// nearby cells outward for the closest enemy when the unit is free to
/// pick one, and flags whether the current target is in weapon range.
#[derive(Default)]
pub struct TargetingWorker;

impl TargetingWorker {
    pub fn new() -> Self {
        Self
    }
}

fn can_switch_target(ai: &Ai) -> bool {
    match ai.order {
        Order::None => true,
        Order::MoveTo(_) => false,
        Order::HoldPosition => false,
        Order::AttackTarget(order) => !order.forced,
    }
}

/// Enemies in the ring at `range`, in the spatial index's cell visit order.
fn collect_ring(
    data: &MatchData,
    id: EntityId,
    owner: OwnerTag,
    center: phalanx_grid::cell::CellCoords,
    range: i32,
    candidates: &mut Vec<EntityId>,
) -> bool {
    let mut found = false;
    data.spatial.for_each_on_ring(center, range, |coords| {
        let hostile = data.spatial.entities_in_cell_where(coords, |other| {
            other != id
                && data
                    .store
                    .value_copied::<OwnerTag>(other)
                    .is_some_and(|o| o.player != owner.player)
        });
        if !hostile.is_empty() {
            candidates.extend(hostile);
            found = true;
        }
    });
    found
}

fn closest(data: &MatchData, from: &Transform, candidates: &[EntityId]) -> Option<EntityId> {
    let mut best: Option<(EntityId, f32)> = None;
    for &candidate in candidates {
        let Some(transform) = data.store.value_copied::<Transform>(candidate) else {
            continue;
        };
        let dist = from.position.squared_distance(transform.position);
        if best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(id, _)| id)
}

impl Worker for TargetingWorker {
    fn name(&self) -> &'static str {
        "targeting"
    }

    fn run_on_entity(&mut self, _dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(mut ai) = data.store.value_copied::<Ai>(id) else {
            return;
        };

        // A dead target voids the order.
        if let Order::AttackTarget(order) = ai.order {
            if !data.store.is_alive(order.target) {
                ai.order = Order::None;
            }
        }

        let owner = data.store.value_copied::<OwnerTag>(id);
        let tag = data.store.value_copied::<CellTag>(id);
        let transform = data.store.value_copied::<Transform>(id);
        let weapon = data.store.value_copied::<Weapon>(id);

        if let (Some(owner), Some(tag), Some(transform), Some(_)) = (owner, tag, transform, weapon)
        {
            if can_switch_target(&ai) {
                // Search outward ring by ring; once something is found,
                // scan one ring further so a marginally closer enemy just
                // past the ring boundary is not missed.
                let mut candidates = Vec::new();
                let mut found_at = None;
                for range in 0..MAX_SEARCH_RANGE {
                    if collect_ring(data, id, owner, tag.coords, range, &mut candidates) {
                        found_at = Some(range);
                        break;
                    }
                }
                let extra = found_at.map_or(MAX_SEARCH_RANGE, |range| range + 1);
                collect_ring(data, id, owner, tag.coords, extra, &mut candidates);

                if let Some(target) = closest(data, &transform, &candidates) {
                    ai.order = Order::AttackTarget(AttackOrder {
                        target,
                        forced: false,
                        can_attack: false,
                        seek: true,
                    });
                }
            }
        }

        // Is the current target in weapon range right now?
        if let (Some(weapon), Some(transform)) = (weapon, transform) {
            if let Order::AttackTarget(ref mut order) = ai.order {
                order.can_attack = data
                    .store
                    .value_copied::<Transform>(order.target)
                    .is_some_and(|target| {
                        transform.position.squared_distance(target.position)
                            < weapon.range * weapon.range
                    });
            }
        }

        data.store.set_value(id, ai);
    }
}
