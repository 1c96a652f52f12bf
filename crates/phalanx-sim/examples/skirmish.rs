//! Runs a small skirmish on an authoritative match and a mirror, printing
//! the shared state digest every simulated second.
//!
//! ```sh
//! cargo run --example skirmish
//! RUST_LOG=debug cargo run --example skirmish
//! ```

use phalanx_sim::prelude::*;

const DT: f32 = 0.05;
const SECONDS: u32 = 30;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = MatchConfig {
        max_entities: 128,
        grid_cells: 10,
        cell_size: 2.0,
        authoritative: true,
        rng_seed: 42,
    };

    let mut spawns = Vec::new();
    for i in 0..5 {
        spawns.push(SpawnRequest {
            object_type: GRUNT.0,
            owner: PlayerId(1),
            position: Position::new(4.0 + i as f32, 0.0, 4.0),
        });
        spawns.push(SpawnRequest {
            object_type: GRUNT.0,
            owner: PlayerId(2),
            position: Position::new(4.0 + i as f32, 0.0, 14.0),
        });
    }
    spawns.push(SpawnRequest {
        object_type: BARRACKS.0,
        owner: PlayerId(1),
        position: Position::new(2.0, 0.0, 2.0),
    });

    let mut server = Match::new(config);
    let mut mirror = Match::new(MatchConfig {
        authoritative: false,
        ..config
    });
    server.start(&spawns);
    mirror.start(&spawns);

    let ticks_per_second = (1.0 / DT) as u32;
    for second in 1..=SECONDS {
        for _ in 0..ticks_per_second {
            server.tick(DT);
            mirror.tick(DT);
        }
        let digest = server.state_digest();
        let in_sync = digest == mirror.state_digest();
        println!(
            "t={second:>3}s alive={:<3} digest={}.. in_sync={in_sync}",
            server.store().alive_count(),
            &digest[..16],
        );
        if !in_sync {
            eprintln!("mirror desynchronized, aborting");
            std::process::exit(1);
        }
    }
}
