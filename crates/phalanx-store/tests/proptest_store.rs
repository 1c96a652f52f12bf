//! Property tests for the entity table's ownership bookkeeping.
//!
//! Arbitrary interleavings of spawns and destroys (including destroys of
//! already-dead ids, which warn and no-op) must leave the table consistent:
//! every living entity owns exactly one slot per attached column, no slot is
//! shared, and the free lists account for every slot not owned.

use std::collections::BTreeSet;

use phalanx_store::prelude::*;
use proptest::collection::vec;
use proptest::prelude::*;

const CAPACITY: u32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Hp(i32);

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Pos(f32, f32);

#[derive(Debug, Clone, Copy)]
enum Op {
    Spawn(i32),
    Destroy(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1i32..100).prop_map(Op::Spawn),
        (0..CAPACITY).prop_map(Op::Destroy),
    ]
}

fn fresh_store() -> EntityStore {
    let mut registry = ColumnRegistry::new();
    registry.register::<Hp>("health");
    registry.register::<Pos>("pos");
    EntityStore::new(CAPACITY, registry)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn spawn_destroy_sequences_keep_ownership_consistent(
        ops in vec(op_strategy(), 1..64)
    ) {
        let mut store = fresh_store();
        let mut alive: BTreeSet<EntityId> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Spawn(hp) => match store.spawn_empty() {
                    Ok(id) => {
                        store.attach(id, Hp(hp));
                        store.attach(id, Pos(hp as f32, 0.0));
                        alive.insert(id);
                    }
                    // Table-full is recoverable and only legal when every
                    // id really is taken.
                    Err(_) => prop_assert_eq!(alive.len(), CAPACITY as usize),
                },
                Op::Destroy(raw) => {
                    // May hit a dead id; the store warns and no-ops.
                    store.destroy(EntityId(raw));
                    alive.remove(&EntityId(raw));
                }
            }
        }

        prop_assert_eq!(store.alive_count(), alive.len());
        let live: Vec<EntityId> = store.live_entities().collect();
        let expected: Vec<EntityId> = alive.iter().copied().collect();
        prop_assert_eq!(live, expected);

        // Exactly one slot per column per living entity, never shared.
        let mut hp_slots = BTreeSet::new();
        let mut pos_slots = BTreeSet::new();
        for &id in &alive {
            let hp = store.slot_for::<Hp>(id);
            let pos = store.slot_for::<Pos>(id);
            prop_assert!(hp.is_some(), "living entity {} owns no health slot", id);
            prop_assert!(pos.is_some(), "living entity {} owns no pos slot", id);
            prop_assert!(hp_slots.insert(hp.unwrap()), "health slot shared");
            prop_assert!(pos_slots.insert(pos.unwrap()), "pos slot shared");
        }

        // Free lists account for every slot the living set does not own.
        let unowned = CAPACITY as usize - alive.len();
        prop_assert_eq!(store.column::<Hp>().free_slots(), unowned);
        prop_assert_eq!(store.column::<Pos>().free_slots(), unowned);
    }

    #[test]
    fn spawn_after_any_destroy_reuses_the_lowest_dead_id(
        doomed in vec(0..CAPACITY, 1..4)
    ) {
        let mut store = fresh_store();
        for _ in 0..CAPACITY {
            let id = store.spawn_empty().unwrap();
            store.attach(id, Hp(1));
        }
        for &raw in &doomed {
            store.destroy(EntityId(raw));
        }
        let lowest = doomed.iter().copied().min().unwrap();
        prop_assert_eq!(store.spawn_empty().unwrap(), EntityId(lowest));
    }
}
