//! Property test: any starting layout replays identically on a mirror.

use phalanx_sim::prelude::*;
use proptest::collection::vec;
use proptest::prelude::*;

const DT: f32 = 0.05;

fn config(authoritative: bool) -> MatchConfig {
    MatchConfig {
        max_entities: 64,
        grid_cells: 8,
        cell_size: 2.0,
        rng_seed: 99,
        authoritative,
    }
}

fn spawn_strategy() -> impl Strategy<Value = SpawnRequest> {
    (0.0f32..16.0, 0.0f32..16.0, 1i32..=2).prop_map(|(x, z, player)| SpawnRequest {
        object_type: GRUNT.0,
        owner: PlayerId(player),
        position: Position::new(x, 0.0, z),
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 16,
        ..ProptestConfig::default()
    })]

    #[test]
    fn any_layout_replays_identically(spawns in vec(spawn_strategy(), 1..12)) {
        let mut server = Match::new(config(true));
        let mut mirror = Match::new(config(false));
        server.start(&spawns);
        mirror.start(&spawns);

        for tick in 0..60 {
            let server_report = server.tick(DT);
            let mirror_report = mirror.tick(DT);
            prop_assert_eq!(server_report, mirror_report, "reports diverged at tick {}", tick);
            prop_assert_eq!(
                server.state_digest(),
                mirror.state_digest(),
                "digests diverged at tick {}",
                tick
            );
        }
    }
}
