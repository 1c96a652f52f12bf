//! End-to-end match scenarios: combat, production, and grid upkeep.

use phalanx_sim::prelude::*;

const DT: f32 = 0.1;

fn small_config() -> MatchConfig {
    MatchConfig {
        max_entities: 64,
        grid_cells: 8,
        cell_size: 2.0,
        authoritative: true,
        rng_seed: 7,
    }
}

fn grunt_at(x: f32, z: f32, player: i32) -> SpawnRequest {
    SpawnRequest {
        object_type: GRUNT.0,
        owner: PlayerId(player),
        position: Position::new(x, 0.0, z),
    }
}

#[test]
fn adjacent_enemies_fight_to_the_death() {
    let mut game = Match::new(small_config());
    game.start(&[grunt_at(8.0, 8.0, 1), grunt_at(9.0, 8.0, 2)]);
    game.tick(DT);

    // Both acquire each other on the first full tick and are in range.
    for id in [EntityId(0), EntityId(1)] {
        let ai = game.store().value_copied::<Ai>(id).unwrap();
        match ai.order {
            Order::AttackTarget(order) => assert!(order.can_attack),
            other => panic!("expected attack order for {id}, got {other:?}"),
        }
    }

    let mut ticks = 0;
    while game.store().alive_count() > 0 && ticks < 3000 {
        game.tick(DT);
        ticks += 1;

        if ticks == 50 {
            // Damage is flowing in both directions by now.
            for id in [EntityId(0), EntityId(1)] {
                let health = game.store().value_copied::<Health>(id).unwrap();
                assert!(health.hp < 100, "{id} took no damage");
            }
        }
    }

    // Symmetric duel: both land the killing blow on the same tick.
    assert_eq!(game.store().alive_count(), 0, "duel never resolved");
}

#[test]
fn distant_enemy_is_chased_into_range() {
    let mut game = Match::new(small_config());
    // 6 world units apart (3 cells), inside the search radius but well
    // outside weapon range.
    game.start(&[grunt_at(4.0, 8.0, 1), grunt_at(10.0, 8.0, 2)]);
    game.tick(DT);

    let ai = game.store().value_copied::<Ai>(EntityId(0)).unwrap();
    assert!(matches!(ai.order, Order::AttackTarget(o) if o.target == EntityId(1)));

    // Both close the gap until they are in range of each other.
    for _ in 0..40 {
        game.tick(DT);
    }
    let a = game.store().value_copied::<Transform>(EntityId(0)).unwrap();
    let b = game.store().value_copied::<Transform>(EntityId(1)).unwrap();
    assert!(a.position.squared_distance(b.position) < 4.0 + 0.5);
}

#[test]
fn hold_position_units_do_not_chase() {
    let mut game = Match::new(small_config());
    game.start(&[grunt_at(4.0, 8.0, 1), grunt_at(10.0, 8.0, 2)]);
    game.tick(DT);

    let hold = Ai {
        order: Order::HoldPosition,
    };
    let event = DataChangeEvent::new(
        game.store().registry(),
        &hold,
        vec![EntityId(0)],
        game.clock(),
        PlayerId(1),
    )
    .unwrap();
    assert!(game.ingest_event(&event));

    for _ in 0..50 {
        game.tick(DT);
    }

    // The holder stayed put while the enemy closed in on it.
    let holder = game.store().value_copied::<Transform>(EntityId(0)).unwrap();
    assert!(holder.position.approx_eq(Position::new(4.0, 0.0, 8.0), 0.5));
    let ai = game.store().value_copied::<Ai>(EntityId(0)).unwrap();
    assert_eq!(ai.order, Order::HoldPosition);
}

#[test]
fn barracks_produces_grunts_near_itself() {
    let mut game = Match::new(small_config());
    game.start(&[SpawnRequest {
        object_type: BARRACKS.0,
        owner: PlayerId(1),
        position: Position::new(8.0, 0.0, 8.0),
    }]);

    // Production period is 10 seconds; 11 simulated seconds covers one
    // production with slack for clock rounding.
    for _ in 0..110 {
        game.tick(DT);
    }
    assert_eq!(game.store().alive_count(), 2);

    let grunt = game
        .store()
        .live_entities()
        .find(|&id| {
            game.store()
                .value_copied::<ObjectKind>(id)
                .is_some_and(|kind| kind.type_id == GRUNT)
        })
        .expect("a grunt was produced");

    let position = game
        .store()
        .value_copied::<Transform>(grunt)
        .unwrap()
        .position;
    assert!((position.x - 8.0).abs() <= 5.0);
    assert!((position.z - 8.0).abs() <= 5.0);
    assert_eq!(
        game.store().value_copied::<OwnerTag>(grunt).unwrap().player,
        PlayerId(1)
    );
}

#[test]
fn moving_units_change_cells() {
    let mut game = Match::new(small_config());
    game.start(&[grunt_at(1.0, 1.0, 1)]);
    game.tick(DT);

    let start_cell = game.spatial().coords_for(Position::new(1.0, 0.0, 1.0));
    assert_eq!(game.spatial().entities_in_cell(start_cell), &[EntityId(0)]);

    let order = Ai {
        order: Order::MoveTo(Position::new(9.0, 0.0, 1.0)),
    };
    let event = DataChangeEvent::new(
        game.store().registry(),
        &order,
        vec![EntityId(0)],
        game.clock(),
        PlayerId(1),
    )
    .unwrap();
    assert!(game.ingest_event(&event));

    for _ in 0..60 {
        game.tick(DT);
    }

    let end_cell = game.spatial().coords_for(Position::new(9.0, 0.0, 1.0));
    assert_ne!(start_cell, end_cell);
    assert!(game.spatial().entities_in_cell(start_cell).is_empty());
    assert_eq!(game.spatial().entities_in_cell(end_cell), &[EntityId(0)]);
}

#[test]
fn dead_units_free_capacity_for_new_spawns() {
    let mut game = Match::new(MatchConfig {
        max_entities: 2,
        grid_cells: 2,
        ..small_config()
    });
    game.start(&[grunt_at(1.0, 1.0, 1), grunt_at(3.0, 3.0, 2)]);
    game.tick(DT);
    assert_eq!(game.store().alive_count(), 2);

    game.request_destroy(EntityId(0));
    game.tick(DT);
    assert_eq!(game.store().alive_count(), 1);

    game.request_spawn(grunt_at(1.0, 1.0, 1));
    let report = game.tick(DT);
    // The freed id is reused.
    assert_eq!(report.spawned, vec![EntityId(0)]);
}
