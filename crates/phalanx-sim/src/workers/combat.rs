//! Weapon timers, damage delivery, and death requests.

use phalanx_store::entity::EntityId;

use crate::columns::{
    Ai, Health, Movement, Order, Weapon, WEAPON_COOLDOWN, WEAPON_DAMAGE, WEAPON_WINDUP,
};
use crate::worker::{MatchData, Worker};

/// Runs each armed unit's weapon: ticks the cooldown, winds up while an
/// in-range target is held and the unit stands still, lands the hit when
/// the windup elapses, and queues a destroy request for anything at or
/// below zero hit points.
#[derive(Default)]
pub struct WeaponWorker;

impl WeaponWorker {
    pub fn new() -> Self {
        Self
    }
}

impl Worker for WeaponWorker {
    fn name(&self) -> &'static str {
        "weapon"
    }

    fn run_on_entity(&mut self, dt: f32, id: EntityId, data: &mut MatchData) {
        if let Some(mut weapon) = data.store.value_copied::<Weapon>(id) {
            if weapon.cooldown >= 0.0 {
                weapon.cooldown -= dt;
            }

            let moving = data
                .store
                .value_copied::<Movement>(id)
                .map_or(false, |m| m.moving());

            if let Some(ai) = data.store.value_copied::<Ai>(id) {
                if let Order::AttackTarget(order) = ai.order {
                    if !moving && order.can_attack && weapon.cooldown < 0.0 {
                        if weapon.windup == 0.0 {
                            weapon.in_use = true;
                        }
                        weapon.windup += dt;
                        if weapon.windup > WEAPON_WINDUP {
                            if let Some(mut health) =
                                data.store.value_copied::<Health>(order.target)
                            {
                                health.hp -= WEAPON_DAMAGE;
                                data.store.set_value(order.target, health);
                            }
                            weapon.windup = 0.0;
                            weapon.in_use = false;
                            weapon.cooldown = WEAPON_COOLDOWN;
                        }
                    } else if weapon.cooldown < 0.0 {
                        weapon.windup = 0.0;
                    }
                }
            }

            data.store.set_value(id, weapon);
        }

        if let Some(health) = data.store.value_copied::<Health>(id) {
            if health.hp <= 0 {
                data.store.request_destroy(id);
            }
        }
    }
}
