//! Periodic unit production.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use phalanx_store::entity::EntityId;
use phalanx_store::position::Position;
use phalanx_store::store::SpawnRequest;

use crate::columns::{OwnerTag, PeriodicSpawner, Transform};
use crate::worker::{MatchData, Worker};

/// Largest offset, on each ground axis, between a producer and the unit it
/// spawns.
const SPAWN_JITTER: f32 = 5.0;

/// Ticks every periodic spawner's clock and enqueues a spawn request when
/// it elapses, scattered around the producer.
///
/// The jitter comes from a PCG stream seeded at match construction, so an
/// authoritative match and a mirror fed the same seed produce identical
/// spawn positions.
pub struct ProductionWorker {
    rng: Pcg64,
}

impl ProductionWorker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl Worker for ProductionWorker {
    fn name(&self) -> &'static str {
        "production"
    }

    fn run_on_entity(&mut self, dt: f32, id: EntityId, data: &mut MatchData) {
        let Some(mut spawner) = data.store.value_copied::<PeriodicSpawner>(id) else {
            return;
        };

        spawner.clock -= dt;
        if spawner.clock <= 0.0 {
            spawner.clock = spawner.cooldown;

            let transform = data.store.value_copied::<Transform>(id);
            let owner = data.store.value_copied::<OwnerTag>(id);
            if let (Some(transform), Some(owner)) = (transform, owner) {
                let dx = self.rng.gen_range(-SPAWN_JITTER..SPAWN_JITTER);
                let dz = self.rng.gen_range(-SPAWN_JITTER..SPAWN_JITTER);
                data.store.request_spawn(SpawnRequest {
                    object_type: spawner.object_type.0,
                    owner: owner.player,
                    position: transform.position + Position::new(dx, 0.0, dz),
                });
            }
        }

        data.store.set_value(id, spawner);
    }
}
