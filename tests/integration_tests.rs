//! # Integration Test Suite
//!
//! Exercises the simulation end to end, driving `SimulationState` directly
//! the way a connected client would via the wire protocol, without needing
//! a live socket. Covers connect/spawn, down/revive, curse cycle, expander
//! stacking, wavering speed bounds, and sniper bullet lifetime.

use shared::enemy::{Enemy, EnemyVariant};
use shared::geometry::Vector2;
use shared::map::Map;
use shared::protocol::Packet;
use std::net::SocketAddr;
use std::sync::Arc;

use server::enemy_engine;
use server::simulation::{Outgoing, SimulationState};

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

fn connect(sim: &mut SimulationState, port: u16) -> u32 {
    sim.handle_packet(addr(port), Packet::PlayerConnect);
    sim.clients.find_by_addr(&addr(port)).unwrap()
}

const STEP: f32 = 1.0 / 240.0;

#[test]
fn connect_and_spawn_places_player_at_map_spawn_point() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 1);

    let outgoing = sim.handle_packet(addr(5000), Packet::PlayerConnect);
    assert_eq!(outgoing.len(), 2);

    let id = sim.clients.find_by_addr(&addr(5000)).unwrap();
    let client = sim.clients.get(id).unwrap();
    assert_eq!(client.player.position, map.spawn_point());
    assert_eq!(client.player.radius, shared::player::DEFAULT_PLAYER_RADIUS);
}

#[test]
fn down_and_revive_cycle_notifies_both_transitions() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 2);

    let victim = connect(&mut sim, 5001);
    let rescuer = connect(&mut sim, 5002);

    sim.clients.get_mut(victim).unwrap().player.down();
    assert!(sim.clients.get(victim).unwrap().player.is_downed());

    let victim_pos = sim.clients.get(victim).unwrap().player.position;
    sim.clients.get_mut(rescuer).unwrap().player.position = victim_pos;

    let out = sim.tick(STEP);
    assert!(!sim.clients.get(victim).unwrap().player.is_downed());

    let revive_notice = out.iter().any(|o| matches!(
        o,
        Outgoing::Broadcast(Packet::PlayerDowned { player_id, is_down: false, .. }) if *player_id == victim
    ));
    assert!(revive_notice, "expected a PlayerDowned(false) notice on revive");
}

#[test]
fn revive_on_already_active_player_is_a_noop() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 3);
    let id = connect(&mut sim, 5003);
    let before = sim.clients.get(id).unwrap().player.position;
    sim.clients.get_mut(id).unwrap().player.revive();
    assert_eq!(sim.clients.get(id).unwrap().player.position, before);
}

#[test]
fn curse_contact_downs_player_after_timer_expires() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 4);
    let id = connect(&mut sim, 5004);

    sim.clients.get_mut(id).unwrap().player.curse();
    assert!(sim.clients.get(id).unwrap().player.is_cursed());

    let mut elapsed = 0.0;
    while elapsed < shared::player::CURSED_DURATION_SECONDS + STEP {
        sim.tick(STEP);
        elapsed += STEP;
    }

    let player = &sim.clients.get(id).unwrap().player;
    assert!(player.is_downed());
    assert!(!player.is_cursed());
}

#[test]
fn expander_hits_stack_radius_then_down_on_fifth() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 5);
    let id = connect(&mut sim, 5005);

    for expected_hits in 1..=4 {
        let downed = enemy_engine::apply_expander_hit(&mut sim.clients.get_mut(id).unwrap().player);
        assert!(!downed);
        assert_eq!(sim.clients.get(id).unwrap().player.expander_hits, expected_hits);
    }
    let downed = enemy_engine::apply_expander_hit(&mut sim.clients.get_mut(id).unwrap().player);
    assert!(downed);
    assert_eq!(sim.clients.get(id).unwrap().player.expander_hits, 0);
}

#[test]
fn wavering_enemy_speed_stays_within_configured_bounds() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 6);

    let mut enemy = Enemy::new_basic(1, EnemyVariant::Wavering, Vector2::new(10.0, 10.0), 5.0, 8.0, 0);
    enemy.min_speed = 3.0;
    enemy.max_speed = 15.0;
    enemy.velocity = Vector2::new(1.0, 0.0).scale(enemy.speed);
    sim.enemies.insert(enemy.id, enemy);

    for _ in 0..(240 * 10) {
        sim.tick(STEP);
        let e = sim.enemies.get(&1).unwrap();
        assert!(e.speed >= e.min_speed && e.speed <= e.max_speed);
    }
}

#[test]
fn sniper_bullet_despawns_after_lifetime() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 7);

    let mut bullet = Enemy::new_basic(1, EnemyVariant::SniperBullet, Vector2::new(400.0, 300.0), 4.0, 100.0, 0);
    bullet.velocity = Vector2::new(1.0, 0.0).scale(bullet.speed);
    sim.enemies.insert(bullet.id, bullet);

    let mut elapsed = 0.0;
    while elapsed < shared::enemy::SNIPER_BULLET_LIFETIME + STEP {
        sim.tick(STEP);
        elapsed += STEP;
    }
    assert!(sim.enemies.get(&1).is_none());
}

#[test]
fn player_status_is_never_both_downed_and_cursed() {
    let map = Arc::new(Map::fallback());
    let mut sim = SimulationState::new(Arc::clone(&map), 8);
    let id = connect(&mut sim, 5008);

    let player = &mut sim.clients.get_mut(id).unwrap().player;
    player.curse();
    player.down();
    assert!(player.is_downed());
    assert!(!player.is_cursed());
}
