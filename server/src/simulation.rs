//! The authoritative per-tick simulation: player integration, map
//! collision, enemy behavior, contact resolution, status timers, and
//! zone-scoped spawn/despawn. One aggregate owns every mutable table and
//! has exclusive `&mut self` access for the duration of a tick — no
//! cross-manager back-pointers to keep in sync.

use crate::client_manager::ClientManager;
use crate::enemy_engine::{self, ContactEffect};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::enemy::{Enemy, EnemyVariant};
use shared::geometry::Vector2;
use shared::map::{Map, ZoneKind};
use shared::player::{Player, PlayerStatus, DEFAULT_PLAYER_SPEED, SHIFT_SPEED_FACTOR, SLIDE_RETENTION};
use shared::protocol::{EnemyStateMsg, Packet, PlayerInput};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

pub const HOUSEKEEPING_INTERVAL: f32 = shared::HOUSEKEEPING_INTERVAL_SECONDS;
pub const CLIENT_TIMEOUT: std::time::Duration =
    std::time::Duration::from_secs(shared::CLIENT_TIMEOUT_SECONDS as u64);

/// A packet this tick wants delivered, either to one address or every
/// connected client.
pub enum Outgoing {
    Unicast(SocketAddr, Packet),
    Broadcast(Packet),
}

pub struct SimulationState {
    pub map: Arc<Map>,
    pub clients: ClientManager,
    pub enemies: HashMap<u32, Enemy>,
    next_enemy_id: u32,
    pub tick: u32,
    rng: StdRng,
    areas_with_enemies: HashSet<usize>,
    housekeeping_accum: f32,
}

impl SimulationState {
    pub fn new(map: Arc<Map>, seed: u64) -> Self {
        SimulationState {
            map,
            clients: ClientManager::new(),
            enemies: HashMap::new(),
            next_enemy_id: 1,
            tick: 0,
            rng: StdRng::seed_from_u64(seed),
            areas_with_enemies: HashSet::new(),
            housekeeping_accum: 0.0,
        }
    }

    /// Handles one just-decoded inbound packet, returning any packets that
    /// must go out immediately (e.g. the MapData handshake).
    pub fn handle_packet(&mut self, addr: SocketAddr, packet: Packet) -> Vec<Outgoing> {
        match packet {
            Packet::PlayerConnect => self.handle_connect(addr),
            Packet::PlayerDisconnect => {
                if let Some(id) = self.clients.find_by_addr(&addr) {
                    info!("client {id} disconnected");
                    self.clients.remove_client(id);
                }
                vec![]
            }
            Packet::PlayerInput(input) => {
                if let Some(id) = self.clients.find_by_addr(&addr) {
                    self.clients.set_input(id, input);
                }
                vec![]
            }
            Packet::Ping => {
                if let Some(id) = self.clients.find_by_addr(&addr) {
                    self.clients.get_mut(id).map(|c| c.touch());
                }
                vec![Outgoing::Unicast(addr, Packet::Pong)]
            }
            Packet::ResetPosition { player_id } => {
                let spawn = self.map.spawn_point();
                if let Some(client) = self.clients.get_mut(player_id) {
                    client.player.respawn(spawn);
                }
                vec![]
            }
            other => {
                warn!("unexpected packet kind from {addr}: {other:?}");
                vec![]
            }
        }
    }

    fn handle_connect(&mut self, addr: SocketAddr) -> Vec<Outgoing> {
        if let Some(existing) = self.clients.find_by_addr(&addr) {
            self.clients.remove_client(existing);
        }
        let spawn = self.map.spawn_point();
        let mut player = Player::new(0, spawn);
        player.area_index = self.map.area_containing(spawn.x, spawn.y).unwrap_or(0);
        let id = self.clients.add_client(addr, player);
        info!("client {id} connected from {addr}");

        vec![
            Outgoing::Unicast(addr, Packet::MapData(map_summary(&self.map))),
            Outgoing::Unicast(addr, self.game_state_packet()),
        ]
    }

    fn game_state_packet(&self) -> Packet {
        Packet::GameState {
            tick: self.tick,
            players: self.clients.iter().map(|c| c.player.to_wire()).collect(),
        }
    }

    fn enemy_update_packet(&self) -> Option<Packet> {
        if self.enemies.is_empty() {
            return None;
        }
        let enemies = self
            .enemies
            .values()
            .map(|e| EnemyStateMsg {
                id: e.id,
                x: e.position.x,
                y: e.position.y,
                radius: e.radius,
                variant: e.variant,
                speed: Some(e.speed),
                min_speed: Some(e.min_speed),
                max_speed: Some(e.max_speed),
                change_progress: Some(enemy_engine::wavering_change_progress(e)),
                is_speed_increasing: Some(e.speed_increasing),
                is_harmless: Some(e.is_harmless),
                harmless_progress: Some(e.harmless_progress()),
                aura_size: Some(e.aura_size),
            })
            .collect();
        Some(Packet::EnemyUpdate { enemies })
    }

    /// Runs one fixed-step tick and returns everything that must be sent
    /// out as a result.
    pub fn tick(&mut self, dt: f32) -> Vec<Outgoing> {
        let mut out = Vec::new();

        self.integrate_players(dt, &mut out);
        self.update_enemies(dt);
        self.remove_invalid_enemies();
        self.resolve_player_enemy_contacts(&mut out);
        self.fire_snipers();
        self.tick_status_timers(dt, &mut out);

        out.push(Outgoing::Broadcast(self.game_state_packet()));
        if let Some(packet) = self.enemy_update_packet() {
            out.push(Outgoing::Broadcast(packet));
        }

        self.housekeeping_accum += dt;
        if self.housekeeping_accum >= HOUSEKEEPING_INTERVAL {
            self.housekeeping_accum = 0.0;
            self.run_housekeeping();
        }

        self.tick += 1;
        if self.tick % (shared::DEFAULT_TICK_RATE_HZ * 5) == 0 {
            debug!(
                "tick {} clients={} enemies={}",
                self.tick,
                self.clients.len(),
                self.enemies.len()
            );
        }
        out
    }

    fn integrate_players(&mut self, dt: f32, out: &mut Vec<Outgoing>) {
        let friction = self.map.properties.friction;
        let enemy_snapshot: Vec<(u32, Vector2, f32, EnemyVariant)> = self
            .enemies
            .values()
            .map(|e| (e.id, e.position, e.radius, e.variant))
            .collect();

        let ids: Vec<u32> = self.clients.iter().map(|c| c.id).collect();
        let mut teleports = Vec::new();
        let mut area_changes = Vec::new();

        for id in &ids {
            let (input, area_idx_before) = {
                let client = self.clients.get(*id).unwrap();
                (client.latest_input.clone(), client.player.area_index)
            };

            let Some(client) = self.clients.get_mut(*id) else { continue };
            if client.player.is_downed() {
                continue;
            }

            client.player.slowed = false;
            for (_, pos, radius, variant) in &enemy_snapshot {
                if *variant == EnemyVariant::Slowing {
                    let dx = client.player.position.x - pos.x;
                    let dy = client.player.position.y - pos.y;
                    if dx * dx + dy * dy <= shared::enemy::SLOWING_AURA_RADIUS * shared::enemy::SLOWING_AURA_RADIUS
                    {
                        client.player.slowed = true;
                    }
                }
                let _ = radius;
            }

            if let Some(area) = self.map.areas.get(client.player.area_index) {
                if let Some(zone) = area.zone_at(client.player.position.x, client.player.position.y) {
                    if zone.kind == ZoneKind::Safe {
                        client.player.clear_curse();
                        if client.player.expander_hits > 0 || client.player.radius != shared::player::DEFAULT_PLAYER_RADIUS {
                            client.player.expander_hits = 0;
                            client.player.radius = shared::player::DEFAULT_PLAYER_RADIUS;
                        }
                    }
                }
            }

            let mut speed = DEFAULT_PLAYER_SPEED;
            if client.player.slowed {
                speed *= shared::player::SLOWED_SPEED_FACTOR;
            }
            let shift = input.as_ref().map(|i| i.bits.shift).unwrap_or(false);
            if shift {
                speed *= SHIFT_SPEED_FACTOR;
            }
            if let Some(area) = self.map.areas.get(client.player.area_index) {
                if let Some(zone) = area.zone_at(client.player.position.x, client.player.position.y) {
                    if zone.kind == ZoneKind::Safe {
                        if let Some(min_speed) = zone.minimum_speed {
                            speed = speed.max(min_speed);
                        }
                    }
                }
            }

            let direction = movement_direction(input.as_ref());
            let base_distance = speed * dt * friction;
            let mut delta = direction.scale(base_distance);
            delta = delta.add(&client.player.slide.scale(SLIDE_RETENTION));
            client.player.slide = delta;

            let target_x = client.player.position.x + delta.x;
            let target_y = client.player.position.y + delta.y;

            let blocked = self
                .map
                .areas
                .get(client.player.area_index)
                .and_then(|a| a.zone_at(target_x, target_y))
                .map(|z| z.kind == ZoneKind::Blocked)
                .unwrap_or(false);

            if !blocked {
                let (rx, ry, _) = self.map.resolve(target_x, target_y, client.player.radius, false);
                client.player.position = Vector2::new(rx, ry);
            }

            let current_area = client.player.area_index;
            if let Some(area) = self.map.areas.get(current_area) {
                if let Some(zone) = area.zone_at(client.player.position.x, client.player.position.y) {
                    if zone.kind == ZoneKind::Exit || zone.kind == ZoneKind::Teleport {
                        let mut new_pos = client.player.position.add(&zone.translate);
                        if zone.translate.x != 0.0 {
                            new_pos.x += client.player.radius * 1.1 * zone.translate.x.signum();
                        } else if zone.translate.y != 0.0 {
                            new_pos.y += client.player.radius * 1.1 * zone.translate.y.signum();
                        } else {
                            new_pos.x += client.player.radius * 1.1;
                        }
                        client.player.position = new_pos;
                        client.latest_input = None;
                        let new_area = self
                            .map
                            .area_containing(new_pos.x, new_pos.y)
                            .unwrap_or(current_area);
                        client.player.area_index = new_area;
                        teleports.push((client.addr, client.id, new_pos));
                        if new_area != area_idx_before {
                            area_changes.push(new_area);
                        }
                    }
                }
            }

            let resolved_area = self
                .map
                .area_containing(client.player.position.x, client.player.position.y)
                .unwrap_or(client.player.area_index);
            if resolved_area != client.player.area_index {
                client.player.area_index = resolved_area;
                area_changes.push(resolved_area);
            }
        }

        for (addr, player_id, pos) in teleports {
            out.push(Outgoing::Broadcast(Packet::PlayerTeleport {
                player_id,
                x: pos.x,
                y: pos.y,
            }));
            let _ = addr;
        }

        self.resolve_revives();
        self.reconcile_spawns(&area_changes);
    }

    fn resolve_revives(&mut self) {
        let ids: Vec<u32> = self.clients.iter().map(|c| c.id).collect();
        let silence_enemies: Vec<&Enemy> = self
            .enemies
            .values()
            .filter(|e| e.variant == EnemyVariant::Silence)
            .collect();

        for rescuer_id in &ids {
            let rescuer_snapshot = {
                let c = self.clients.get(*rescuer_id).unwrap();
                (c.player.position, c.player.radius, c.player.is_downed(), c.player.silenced)
            };
            if rescuer_snapshot.2 || rescuer_snapshot.3 {
                continue;
            }
            for target_id in &ids {
                if target_id == rescuer_id {
                    continue;
                }
                let Some(target) = self.clients.get_mut(*target_id) else { continue };
                if !target.player.is_downed() || target.player.silenced {
                    continue;
                }
                let target_in_aura = silence_enemies.iter().any(|e| {
                    enemy_engine::is_player_in_silence_aura(e, target.player.position.x, target.player.position.y)
                });
                if target_in_aura {
                    continue;
                }
                let dx = rescuer_snapshot.0.x - target.player.position.x;
                let dy = rescuer_snapshot.0.y - target.player.position.y;
                let touching = dx * dx + dy * dy
                    <= (rescuer_snapshot.1 + target.player.radius) * (rescuer_snapshot.1 + target.player.radius);
                if touching {
                    target.player.revive();
                }
            }
        }
    }

    fn update_enemies(&mut self, dt: f32) {
        let silence_ids: Vec<u32> = self
            .enemies
            .values()
            .filter(|e| e.variant == EnemyVariant::Silence)
            .map(|e| e.id)
            .collect();
        let player_positions: Vec<Vector2> = self.clients.iter().map(|c| c.player.position).collect();

        for id in silence_ids {
            if let Some(enemy) = self.enemies.get_mut(&id) {
                for pos in &player_positions {
                    enemy_engine::mark_player_in_silence_aura(enemy, pos.x, pos.y);
                }
            }
        }

        for client in self.clients.iter_mut() {
            client.player.silenced = self.enemies.values().any(|e| {
                e.variant == EnemyVariant::Silence
                    && {
                        let dx = client.player.position.x - e.position.x;
                        let dy = client.player.position.y - e.position.y;
                        dx * dx + dy * dy <= e.aura_size * e.aura_size
                    }
            });
        }

        let mut rng = std::mem::replace(&mut self.rng, StdRng::seed_from_u64(0));
        for enemy in self.enemies.values_mut() {
            enemy_engine::update_behavior(enemy, dt, &mut rng);
            enemy.position = enemy.position.add(&enemy.velocity.scale(dt));
            let (rx, ry, adjusted) = self.map.resolve(enemy.position.x, enemy.position.y, enemy.radius, true);
            if adjusted {
                let normal = Vector2::new(
                    (rx - enemy.position.x).signum(),
                    (ry - enemy.position.y).signum(),
                );
                enemy_engine::reflect_off_map(enemy, normal.normalize());
                if enemy.variant == EnemyVariant::SniperBullet {
                    enemy.time_lived = shared::enemy::SNIPER_BULLET_LIFETIME;
                }
            }
            enemy.position = Vector2::new(rx, ry);
            if enemy.variant == EnemyVariant::Wall {
                let next = enemy.position.add(&enemy.velocity.scale(dt));
                if let Some(area) = self.map.areas.get(enemy.area_index) {
                    if let Some(zone) = area.zone_at(enemy.position.x, enemy.position.y) {
                        let zl = area.x + zone.bounds.left;
                        let zt = area.y + zone.bounds.top;
                        let zr = area.x + zone.bounds.right;
                        let zb = area.y + zone.bounds.bottom;
                        let hit = match enemy.wall_direction {
                            shared::enemy::WallDirection::Up => next.y - enemy.radius <= zt,
                            shared::enemy::WallDirection::Right => next.x + enemy.radius >= zr,
                            shared::enemy::WallDirection::Down => next.y + enemy.radius >= zb,
                            shared::enemy::WallDirection::Left => next.x - enemy.radius <= zl,
                        };
                        if hit {
                            enemy.wall_direction = enemy.wall_direction.rotate(enemy.move_clockwise);
                        }
                    }
                }
            }
        }
        self.rng = rng;
    }

    fn remove_invalid_enemies(&mut self) {
        let map = Arc::clone(&self.map);
        self.enemies.retain(|_, enemy| {
            if enemy.variant == EnemyVariant::SniperBullet && enemy.time_lived >= shared::enemy::SNIPER_BULLET_LIFETIME
            {
                return false;
            }
            match map.area_containing(enemy.position.x, enemy.position.y) {
                None => false,
                Some(area_idx) => {
                    enemy.area_index = area_idx;
                    let area = &map.areas[area_idx];
                    match area.zone_at(enemy.position.x, enemy.position.y) {
                        None => false,
                        Some(zone) => {
                            if zone.kind == ZoneKind::Blocked {
                                false
                            } else if enemy.variant == EnemyVariant::SniperBullet && zone.kind == ZoneKind::Safe {
                                false
                            } else {
                                true
                            }
                        }
                    }
                }
            }
        });
    }

    fn resolve_player_enemy_contacts(&mut self, out: &mut Vec<Outgoing>) {
        let ids: Vec<u32> = self.clients.iter().map(|c| c.id).collect();
        let mut harmless_updates = Vec::new();

        for id in ids {
            let Some(client) = self.clients.get_mut(id) else { continue };
            if client.player.is_downed() {
                continue;
            }
            let area_idx = client.player.area_index;
            let pos = client.player.position;
            let radius = client.player.radius;

            let mut hit_variant = None;
            let mut hit_id = None;
            for enemy in self.enemies.values() {
                if enemy.area_index != area_idx || enemy.is_harmless {
                    continue;
                }
                let dx = pos.x - enemy.position.x;
                let dy = pos.y - enemy.position.y;
                let touching = dx * dx + dy * dy <= (radius + enemy.radius) * (radius + enemy.radius);
                if touching {
                    hit_variant = Some(enemy.variant);
                    hit_id = Some(enemy.id);
                    break;
                }
            }

            let Some(variant) = hit_variant else { continue };
            match enemy_engine::contact_effect(variant) {
                ContactEffect::Down => {
                    client.player.down();
                    out.push(Outgoing::Broadcast(Packet::PlayerDowned {
                        player_id: id,
                        is_down: true,
                        seconds_remaining: client.player.downed_timer as u8,
                    }));
                    if variant == EnemyVariant::SniperBullet {
                        harmless_updates.push((hit_id.unwrap(), 0.1));
                    }
                }
                ContactEffect::Curse => {
                    client.player.curse();
                    out.push(Outgoing::Broadcast(Packet::PlayerCursed {
                        player_id: id,
                        is_cursed: true,
                        seconds_remaining: client.player.cursed_timer,
                    }));
                    harmless_updates.push((hit_id.unwrap(), shared::enemy::CURSED_HARMLESS_DURATION));
                }
                ContactEffect::Expand => {
                    let downed = enemy_engine::apply_expander_hit(&mut client.player);
                    if downed {
                        client.player.down();
                        out.push(Outgoing::Broadcast(Packet::PlayerDowned {
                            player_id: id,
                            is_down: true,
                            seconds_remaining: client.player.downed_timer as u8,
                        }));
                    } else {
                        harmless_updates.push((hit_id.unwrap(), shared::enemy::EXPANDER_HARMLESS_DURATION));
                    }
                }
                ContactEffect::None => {}
            }
        }

        for (id, duration) in harmless_updates {
            if let Some(enemy) = self.enemies.get_mut(&id) {
                enemy.set_harmless(duration);
            }
        }
    }

    fn fire_snipers(&mut self) {
        let sniper_ids: Vec<u32> = self
            .enemies
            .values()
            .filter(|e| e.variant == EnemyVariant::Sniper && e.time_since_last_shot >= shared::enemy::SNIPER_RELEASE_TIME)
            .map(|e| e.id)
            .collect();

        let players: Vec<Player> = self.clients.iter().map(|c| c.player.clone()).collect();
        let mut new_bullets = Vec::new();

        for id in sniper_ids {
            let Some(sniper) = self.enemies.get_mut(&id) else { continue };
            sniper.time_since_last_shot = 0.0;
            let sniper_snapshot = sniper.clone();
            if let Some(target) = enemy_engine::find_sniper_target(&sniper_snapshot, players.iter(), &self.map) {
                let bullet_id = self.next_enemy_id;
                self.next_enemy_id += 1;
                new_bullets.push(enemy_engine::spawn_bullet(bullet_id, &sniper_snapshot, target));
            }
        }
        for bullet in new_bullets {
            self.enemies.insert(bullet.id, bullet);
        }
    }

    fn tick_status_timers(&mut self, dt: f32, out: &mut Vec<Outgoing>) {
        let ids: Vec<u32> = self.clients.iter().map(|c| c.id).collect();
        for id in ids {
            let spawn = self.map.spawn_point();
            let Some(client) = self.clients.get_mut(id) else { continue };
            match client.player.status {
                PlayerStatus::Downed => {
                    let before = client.player.downed_timer.ceil() as u8;
                    client.player.downed_timer = (client.player.downed_timer - dt).max(0.0);
                    let after = client.player.downed_timer.ceil() as u8;
                    if client.player.downed_timer <= 0.0 {
                        client.player.respawn(spawn);
                        out.push(Outgoing::Broadcast(Packet::PlayerDowned {
                            player_id: id,
                            is_down: false,
                            seconds_remaining: 0,
                        }));
                    } else if after != before {
                        out.push(Outgoing::Broadcast(Packet::PlayerDowned {
                            player_id: id,
                            is_down: true,
                            seconds_remaining: after,
                        }));
                    }
                }
                PlayerStatus::Cursed => {
                    client.player.cursed_timer -= dt;
                    if client.player.cursed_timer <= 0.0 {
                        client.player.cursed_timer = 0.0;
                        client.player.down();
                        out.push(Outgoing::Broadcast(Packet::PlayerCursed {
                            player_id: id,
                            is_cursed: false,
                            seconds_remaining: 0.0,
                        }));
                        out.push(Outgoing::Broadcast(Packet::PlayerDowned {
                            player_id: id,
                            is_down: true,
                            seconds_remaining: client.player.downed_timer as u8,
                        }));
                    } else {
                        out.push(Outgoing::Broadcast(Packet::PlayerCursed {
                            player_id: id,
                            is_cursed: true,
                            seconds_remaining: client.player.cursed_timer,
                        }));
                    }
                }
                PlayerStatus::Active => {}
            }
        }
    }

    fn run_housekeeping(&mut self) {
        let removed = self.clients.check_timeouts(CLIENT_TIMEOUT);
        for id in removed {
            info!("client {id} timed out");
        }

        let occupied: HashSet<usize> = self.clients.iter().map(|c| c.player.area_index).collect();

        let to_spawn: Vec<usize> = occupied.difference(&self.areas_with_enemies).copied().collect();
        let to_despawn: Vec<usize> = self.areas_with_enemies.difference(&occupied).copied().collect();

        for area_idx in to_spawn {
            self.spawn_enemies_for_area(area_idx);
        }
        for area_idx in to_despawn {
            self.despawn_enemies_in_area(area_idx);
        }
        self.areas_with_enemies = occupied;
    }

    fn reconcile_spawns(&mut self, changed_areas: &[usize]) {
        if changed_areas.is_empty() {
            return;
        }
        let occupied: HashSet<usize> = self.clients.iter().map(|c| c.player.area_index).collect();
        for area_idx in changed_areas {
            if occupied.contains(area_idx) && !self.areas_with_enemies.contains(area_idx) {
                self.spawn_enemies_for_area(*area_idx);
                self.areas_with_enemies.insert(*area_idx);
            }
        }
    }

    fn spawn_enemies_for_area(&mut self, area_idx: usize) {
        let Some(area) = self.map.areas.get(area_idx) else { return };
        let mut spawned = Vec::new();
        for zone in &area.zones {
            if zone.kind != ZoneKind::Active {
                continue;
            }
            let world_bounds = shared::geometry::Aabb::new(
                area.x + zone.bounds.left,
                area.y + zone.bounds.top,
                area.x + zone.bounds.right,
                area.y + zone.bounds.bottom,
            );
            for spawner in &zone.spawners {
                let enemies = enemy_engine::spawn_from_spawner(
                    &mut self.next_enemy_id,
                    spawner,
                    world_bounds,
                    area_idx,
                    &mut self.rng,
                );
                spawned.extend(enemies);
            }
        }
        if !spawned.is_empty() {
            debug!("spawned {} enemies in area {}", spawned.len(), area_idx);
        }
        for enemy in spawned {
            self.enemies.insert(enemy.id, enemy);
        }
        self.areas_with_enemies.insert(area_idx);
    }

    fn despawn_enemies_in_area(&mut self, area_idx: usize) {
        self.enemies.retain(|_, e| e.area_index != area_idx);
        self.areas_with_enemies.remove(&area_idx);
    }
}

fn movement_direction(input: Option<&PlayerInput>) -> Vector2 {
    let Some(input) = input else { return Vector2::ZERO };

    if input.bits.mouse_control {
        if let Some(m) = input.mouse {
            return Vector2::new(m.dir_x, m.dir_y).scale(m.distance);
        }
    }
    if input.bits.joystick_control {
        if let Some(j) = input.joystick {
            return Vector2::new(j.dir_x, j.dir_y).scale(j.distance);
        }
    }

    let mut dx = 0.0;
    let mut dy = 0.0;
    if input.bits.move_right {
        dx += 1.0;
    }
    if input.bits.move_left {
        dx -= 1.0;
    }
    if input.bits.move_down {
        dy += 1.0;
    }
    if input.bits.move_up {
        dy -= 1.0;
    }
    // Deliberately not normalized: diagonal keyboard input moves at
    // shared::player::DIAGONAL_BOOST (sqrt(2)) times cardinal speed.
    Vector2::new(dx, dy)
}

fn map_summary(map: &Map) -> String {
    serde_json::json!({
        "name": map.name,
        "areas": map.areas.len(),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::map::Map;

    fn test_map() -> Arc<Map> {
        Arc::new(Map::fallback())
    }

    #[test]
    fn connect_spawns_player_at_map_spawn_point() {
        let mut sim = SimulationState::new(test_map(), 1);
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let _ = sim.handle_packet(addr, Packet::PlayerConnect);
        assert_eq!(sim.clients.len(), 1);
        let client = sim.clients.iter().next().unwrap();
        assert_eq!(client.player.position, sim.map.spawn_point());
    }

    #[test]
    fn tick_without_clients_still_advances() {
        let mut sim = SimulationState::new(test_map(), 1);
        let out = sim.tick(1.0 / 240.0);
        assert_eq!(sim.tick, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn disconnect_removes_client() {
        let mut sim = SimulationState::new(test_map(), 1);
        let addr: SocketAddr = "127.0.0.1:4001".parse().unwrap();
        sim.handle_packet(addr, Packet::PlayerConnect);
        sim.handle_packet(addr, Packet::PlayerDisconnect);
        assert!(sim.clients.is_empty());
    }

    #[test]
    fn diagonal_keyboard_input_moves_faster_than_a_cardinal_direction() {
        use shared::protocol::InputBits;

        let straight = movement_direction(Some(&PlayerInput {
            bits: InputBits { move_right: true, ..Default::default() },
            mouse: None,
            joystick: None,
        }));
        let diagonal = movement_direction(Some(&PlayerInput {
            bits: InputBits { move_right: true, move_down: true, ..Default::default() },
            mouse: None,
            joystick: None,
        }));

        assert_eq!(straight.magnitude(), 1.0);
        assert!((diagonal.magnitude() - shared::player::DIAGONAL_BOOST).abs() < 1e-6);
    }
}
