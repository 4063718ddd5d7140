//! # Performance Benchmark Test Suite
//!
//! Coarse throughput checks for the simulation's hot path: a populated
//! world (many players, many enemies of every variant) must finish a batch
//! of ticks within a generous, hardware-independent wall-clock bound. This
//! is a smoke check for runaway complexity, not a precise timing harness.

use shared::enemy::{Enemy, EnemyVariant};
use shared::geometry::Vector2;
use shared::map::Map;
use shared::protocol::Packet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use server::simulation::SimulationState;

const STEP: f32 = 1.0 / 240.0;

fn populated_simulation(num_players: u32, num_enemies: u32) -> SimulationState {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(map, 123);

    for i in 0..num_players {
        let a: SocketAddr = format!("127.0.0.1:{}", 6000 + i).parse().unwrap();
        sim.handle_packet(a, Packet::PlayerConnect);
    }

    let variants = [
        EnemyVariant::Normal,
        EnemyVariant::Cursed,
        EnemyVariant::Wall,
        EnemyVariant::Slowing,
        EnemyVariant::Immune,
        EnemyVariant::Wavering,
        EnemyVariant::Expander,
        EnemyVariant::Silence,
        EnemyVariant::Sniper,
        EnemyVariant::Dasher,
    ];
    for i in 0..num_enemies {
        let variant = variants[(i as usize) % variants.len()];
        let pos = Vector2::new((i % 700) as f32 + 10.0, (i % 500) as f32 + 10.0);
        let mut enemy = Enemy::new_basic(1000 + i, variant, pos, 8.0, 80.0, 0);
        enemy.velocity = Vector2::new(1.0, 0.3).normalize().scale(enemy.speed);
        sim.enemies.insert(enemy.id, enemy);
    }

    sim
}

#[test]
fn ticking_a_populated_world_completes_within_a_generous_bound() {
    let mut sim = populated_simulation(16, 200);

    let start = Instant::now();
    for _ in 0..600 {
        sim.tick(STEP);
    }
    let elapsed = start.elapsed();

    // 600 ticks of a 16-player, 200-enemy world should comfortably finish
    // well inside a few seconds on any reasonable machine, single-threaded.
    assert!(
        elapsed.as_secs_f64() < 10.0,
        "600 ticks took {:?}, suspiciously slow",
        elapsed
    );
}

#[test]
fn codec_round_trip_throughput_is_not_pathological() {
    let packet = Packet::GameState {
        tick: 1,
        players: (0..32)
            .map(|i| shared::protocol::PlayerStateMsg {
                id: i,
                x: i as f32,
                y: i as f32,
                radius: 15.0,
                is_downed: false,
                downed_timer: 0,
                is_cursed: false,
                cursed_timer: 0.0,
            })
            .collect(),
    };

    let start = Instant::now();
    for _ in 0..10_000 {
        let bytes = shared::protocol::encode(&packet);
        let _ = shared::protocol::decode(&bytes).unwrap();
    }
    let elapsed = start.elapsed();

    assert!(
        elapsed.as_secs_f64() < 5.0,
        "10k encode/decode round trips took {:?}",
        elapsed
    );
}
