//! Per-variant enemy behavior, contact effects, and the zone-scoped
//! spawner/despawner. Dispatch is a single `match` on `EnemyVariant` rather
//! than virtual calls plus downcasts (see DESIGN.md).

use rand::rngs::StdRng;
use rand::Rng;
use shared::enemy::*;
use shared::geometry::Vector2;
use shared::map::{Map, Spawner, ZoneKind};
use shared::player::Player;

fn random_direction(rng: &mut StdRng) -> Vector2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vector2::from_angle(angle)
}

/// Advances one enemy's velocity/variant-state for `dt` seconds. Positional
/// integration and map collision happen afterward in the simulation loop.
pub fn update_behavior(enemy: &mut Enemy, dt: f32, rng: &mut StdRng) {
    enemy.tick_harmless(dt);

    match enemy.variant {
        EnemyVariant::Normal
        | EnemyVariant::Cursed
        | EnemyVariant::Immune
        | EnemyVariant::Expander => {
            if enemy.velocity.magnitude_squared() == 0.0 {
                enemy.velocity = random_direction(rng).scale(enemy.speed);
            }
        }
        EnemyVariant::Slowing => {
            if enemy.velocity.magnitude_squared() == 0.0 {
                enemy.velocity = random_direction(rng).scale(enemy.speed);
            }
        }
        EnemyVariant::Wall => {
            // Velocity is driven by wall_direction; nothing to do here
            // until the simulation loop detects a wall hit and rotates it.
            enemy.velocity = enemy.wall_direction.velocity(enemy.speed);
        }
        EnemyVariant::Wavering => update_wavering(enemy, dt),
        EnemyVariant::Silence => {
            if enemy.velocity.magnitude_squared() == 0.0 {
                enemy.velocity = random_direction(rng).scale(enemy.speed);
            }
            update_silence_aura(enemy, dt);
        }
        EnemyVariant::Sniper => {
            if enemy.velocity.magnitude_squared() == 0.0 {
                enemy.velocity = random_direction(rng).scale(enemy.speed);
            }
            enemy.time_since_last_shot += dt;
        }
        EnemyVariant::SniperBullet => {
            enemy.time_lived += dt;
        }
        EnemyVariant::Dasher => update_dasher(enemy, dt),
    }
}

fn update_wavering(enemy: &mut Enemy, dt: f32) {
    const SPEED_CHANGE_FACTOR: f32 = 2.5;
    const SPEED_STEP: f32 = 2.0;

    enemy.wavering_clock += dt * SPEED_CHANGE_FACTOR;
    if enemy.wavering_clock > enemy.speed_change_interval {
        if enemy.speed_increasing {
            enemy.speed += SPEED_STEP;
        } else {
            enemy.speed -= SPEED_STEP;
        }
        if enemy.speed <= enemy.min_speed || enemy.speed >= enemy.max_speed {
            enemy.speed_increasing = !enemy.speed_increasing;
            enemy.speed = enemy.speed.clamp(enemy.min_speed, enemy.max_speed);
        }
        enemy.wavering_clock = 0.0;
    }

    if enemy.velocity.magnitude_squared() > 0.0 {
        let dir = enemy.velocity.normalize();
        enemy.velocity = dir.scale(enemy.speed);
    }
}

/// Normalized position within the last quarter-second of the speed-change
/// interval, for client-side color tweening.
pub fn wavering_change_progress(enemy: &Enemy) -> f32 {
    let transition_start = enemy.speed_change_interval - 0.25;
    if enemy.wavering_clock > transition_start {
        ((enemy.wavering_clock - transition_start) / 0.25).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn update_silence_aura(enemy: &mut Enemy, dt: f32) {
    if enemy.has_silenced_player {
        if !enemy.was_player_in_aura_last_frame {
            enemy.player_in_aura_timer = SILENCE_EXIT_HYSTERESIS;
        }
        enemy.was_player_in_aura_last_frame = true;
    } else if enemy.was_player_in_aura_last_frame {
        enemy.player_in_aura_timer = 0.0;
        enemy.was_player_in_aura_last_frame = false;
    }

    let mut players_in_aura = enemy.has_silenced_player;
    if enemy.player_in_aura_timer > 0.0 {
        enemy.player_in_aura_timer -= dt;
        if enemy.player_in_aura_timer <= 0.0 {
            enemy.player_in_aura_timer = 0.0;
        } else {
            players_in_aura = false;
        }
    }

    let time_factor = dt * 280.0;
    enemy.target_aura_size = if players_in_aura {
        (enemy.aura_size - SILENCE_AURA_SHRINK_RATE * time_factor).max(0.0)
    } else {
        (enemy.aura_size + SILENCE_AURA_GROW_RATE * time_factor).min(enemy.max_aura_size)
    };
    let diff = enemy.target_aura_size - enemy.aura_size;
    enemy.aura_size = (enemy.aura_size + diff * SILENCE_SMOOTHING_FACTOR).clamp(0.0, enemy.max_aura_size);

    enemy.has_silenced_player = false;
}

/// True if `(player_x, player_y)` currently falls inside a Silence enemy's
/// aura. Pure: does not mark the enemy's `has_silenced_player` flag.
pub fn is_player_in_silence_aura(enemy: &Enemy, player_x: f32, player_y: f32) -> bool {
    let dx = player_x - enemy.position.x;
    let dy = player_y - enemy.position.y;
    dx * dx + dy * dy <= enemy.aura_size * enemy.aura_size
}

/// Call once per tick for every player currently inside a Silence enemy's
/// aura, before `update_behavior` runs for that enemy.
pub fn mark_player_in_silence_aura(enemy: &mut Enemy, player_x: f32, player_y: f32) -> bool {
    let inside = is_player_in_silence_aura(enemy, player_x, player_y);
    if inside {
        enemy.has_silenced_player = true;
    }
    inside
}

pub fn is_player_in_slowing_aura(enemy: &Enemy, player_x: f32, player_y: f32) -> bool {
    let dx = player_x - enemy.position.x;
    let dy = player_y - enemy.position.y;
    dx * dx + dy * dy <= SLOWING_AURA_RADIUS * SLOWING_AURA_RADIUS
}

fn update_dasher(enemy: &mut Enemy, dt: f32) {
    let current_angle = enemy.velocity.angle();
    if (current_angle - enemy.dasher_old_angle).abs() > 0.1 {
        enemy.dasher_old_angle = current_angle;
    }

    match enemy.dash_phase {
        DashPhase::Idle { time_since_last } if time_since_last < DASHER_TIME_BETWEEN_DASHES => {
            enemy.dash_phase = DashPhase::Idle {
                time_since_last: time_since_last + dt,
            };
        }
        DashPhase::Preparing { elapsed } => {
            let elapsed = elapsed + dt;
            enemy.dash_phase = if elapsed >= DASHER_TIME_TO_PREPARE {
                DashPhase::Dashing { elapsed: dt }
            } else {
                DashPhase::Preparing { elapsed }
            };
        }
        DashPhase::Dashing { elapsed } => {
            let elapsed = elapsed + dt;
            enemy.dash_phase = if elapsed >= DASHER_TIME_TO_DASH {
                DashPhase::Idle {
                    time_since_last: 0.0,
                }
            } else {
                DashPhase::Dashing { elapsed }
            };
        }
        DashPhase::Idle { .. } => {
            enemy.dash_phase = DashPhase::Preparing { elapsed: dt };
        }
    }

    let current_speed = match enemy.dash_phase {
        DashPhase::Idle { .. } => enemy.dasher_normal_speed * DASHER_BASE_SPEED_FACTOR,
        DashPhase::Preparing { elapsed } => {
            let progress = elapsed / DASHER_TIME_TO_PREPARE;
            enemy.dasher_normal_speed * DASHER_PREPARE_SPEED_FACTOR * (1.0 - progress)
        }
        DashPhase::Dashing { elapsed } => {
            let progress = elapsed / DASHER_TIME_TO_DASH;
            enemy.dasher_normal_speed * (1.0 - progress * 0.5)
        }
    };

    if enemy.velocity.magnitude() > 0.001 {
        enemy.velocity = enemy.velocity.normalize().scale(current_speed);
    } else {
        enemy.velocity = Vector2::from_angle(enemy.dasher_old_angle).scale(current_speed);
    }
    enemy.speed = current_speed;
}

/// Reflects a moving enemy's velocity off a map-collision normal, keeping
/// Dasher's remembered heading in sync with the new direction.
pub fn reflect_off_map(enemy: &mut Enemy, normal: Vector2) {
    enemy.velocity = enemy.velocity.reflect(&normal);
    if enemy.variant == EnemyVariant::Dasher {
        enemy.dasher_old_angle = enemy.velocity.angle();
    }
}

/// Outcome of a non-harmless enemy touching a player.
pub enum ContactEffect {
    Down,
    Curse,
    Expand,
    None,
}

pub fn contact_effect(variant: EnemyVariant) -> ContactEffect {
    match variant {
        EnemyVariant::Normal
        | EnemyVariant::Wall
        | EnemyVariant::Slowing
        | EnemyVariant::Immune
        | EnemyVariant::Wavering
        | EnemyVariant::Silence
        | EnemyVariant::Sniper
        | EnemyVariant::SniperBullet
        | EnemyVariant::Dasher => ContactEffect::Down,
        EnemyVariant::Cursed => ContactEffect::Curse,
        EnemyVariant::Expander => ContactEffect::Expand,
    }
}

/// Applies an Expander hit to the player; returns true if the hit downs them
/// (the fifth hit), resetting the hit counter either way.
pub fn apply_expander_hit(player: &mut Player) -> bool {
    player.expander_hits += 1;
    if player.expander_hits >= EXPANDER_MAX_HITS {
        player.expander_hits = 0;
        true
    } else {
        player.radius += EXPANDER_RADIUS_GROWTH;
        false
    }
}

/// Finds the closest live, non-downed player within range that is not
/// standing in a Safe zone, for a Sniper's firing decision.
pub fn find_sniper_target<'a>(
    sniper: &Enemy,
    players: impl Iterator<Item = &'a Player>,
    map: &Map,
) -> Option<&'a Player> {
    let mut best: Option<(&Player, f32)> = None;
    for player in players {
        if player.is_downed() {
            continue;
        }
        if player.area_index != sniper.area_index {
            continue;
        }
        if let Some(area) = map.areas.get(player.area_index) {
            if let Some(zone) = area.zone_at(player.position.x, player.position.y) {
                if zone.kind == ZoneKind::Safe {
                    continue;
                }
            }
        }
        let dx = player.position.x - sniper.position.x;
        let dy = player.position.y - sniper.position.y;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > SNIPER_DETECTION_DISTANCE * SNIPER_DETECTION_DISTANCE {
            continue;
        }
        if best.map(|(_, d)| dist_sq < d).unwrap_or(true) {
            best = Some((player, dist_sq));
        }
    }
    best.map(|(p, _)| p)
}

pub fn spawn_bullet(id: u32, sniper: &Enemy, target: &Player) -> Enemy {
    let dx = target.position.x - sniper.position.x;
    let dy = target.position.y - sniper.position.y;
    let angle = dy.atan2(dx);
    let speed = sniper.speed * SNIPER_BULLET_SPEED_FACTOR;
    let mut bullet = Enemy::new_basic(
        id,
        EnemyVariant::SniperBullet,
        sniper.position,
        sniper.radius / 2.0,
        speed,
        sniper.area_index,
    );
    bullet.angle = angle;
    bullet.velocity = Vector2::from_angle(angle).scale(speed);
    bullet
}

fn jittered_sniper_cooldown(rng: &mut StdRng) -> f32 {
    rng.gen_range(0.0..(SNIPER_RELEASE_TIME * 0.75))
}

/// Places `count` enemies of the spawner's variant(s) uniformly inside the
/// zone's world-space rectangle.
pub fn spawn_from_spawner(
    next_id: &mut u32,
    spawner: &Spawner,
    zone_bounds_world: shared::geometry::Aabb,
    area_index: usize,
    rng: &mut StdRng,
) -> Vec<Enemy> {
    let mut out = Vec::with_capacity(spawner.count as usize);
    if spawner.enemy_types.is_empty() {
        return out;
    }
    let wall_side = rng.gen_range(0..4);
    for i in 0..spawner.count {
        let variant = spawner.enemy_types[rng.gen_range(0..spawner.enemy_types.len())];
        let speed = spawner.speed.unwrap_or_else(|| {
            if spawner.max_speed > spawner.min_speed {
                rng.gen_range(spawner.min_speed..spawner.max_speed)
            } else {
                spawner.min_speed
            }
        });

        let id = *next_id;
        *next_id += 1;

        let mut enemy = match variant {
            shared::enemy::EnemyVariant::Wall => {
                let local = place_wall_enemy(
                    zone_bounds_world.width(),
                    zone_bounds_world.height(),
                    spawner.radius,
                    i,
                    spawner.count.max(1),
                    wall_side,
                    spawner.move_clockwise,
                );
                let mut e = Enemy::new_basic(
                    id,
                    variant,
                    Vector2::new(
                        zone_bounds_world.left + local.0,
                        zone_bounds_world.top + local.1,
                    ),
                    spawner.radius,
                    speed,
                    area_index,
                );
                e.wall_direction = local.2;
                e.move_clockwise = spawner.move_clockwise;
                e.velocity = e.wall_direction.velocity(e.speed);
                e
            }
            shared::enemy::EnemyVariant::Wavering => {
                let x = rng.gen_range(
                    zone_bounds_world.left + spawner.radius..zone_bounds_world.right - spawner.radius,
                );
                let y = rng.gen_range(
                    zone_bounds_world.top + spawner.radius..zone_bounds_world.bottom - spawner.radius,
                );
                let mut e = Enemy::new_basic(id, variant, Vector2::new(x, y), spawner.radius, speed, area_index);
                e.min_speed = spawner.min_speed;
                e.max_speed = spawner.max_speed;
                e.speed_change_interval = 0.25;
                e
            }
            shared::enemy::EnemyVariant::Sniper => {
                let x = rng.gen_range(
                    zone_bounds_world.left + spawner.radius..zone_bounds_world.right - spawner.radius,
                );
                let y = rng.gen_range(
                    zone_bounds_world.top + spawner.radius..zone_bounds_world.bottom - spawner.radius,
                );
                let mut e = Enemy::new_basic(id, variant, Vector2::new(x, y), spawner.radius, speed, area_index);
                e.time_since_last_shot = jittered_sniper_cooldown(rng);
                e
            }
            _ => {
                let x = rng.gen_range(
                    zone_bounds_world.left + spawner.radius..zone_bounds_world.right - spawner.radius,
                );
                let y = rng.gen_range(
                    zone_bounds_world.top + spawner.radius..zone_bounds_world.bottom - spawner.radius,
                );
                Enemy::new_basic(id, variant, Vector2::new(x, y), spawner.radius, speed, area_index)
            }
        };
        if enemy.velocity.magnitude_squared() == 0.0 && !matches!(variant, shared::enemy::EnemyVariant::Wall) {
            enemy.velocity = random_direction(rng).scale(enemy.speed);
        }
        out.push(enemy);
    }
    out
}

/// Walks `wallIndex * perimeter / totalCount` distance around the zone's
/// perimeter starting from `initial_side`, returning the local `(x, y)` and
/// the direction the enemy faces once placed.
fn place_wall_enemy(
    zone_width: f32,
    zone_height: f32,
    radius: f32,
    wall_index: u32,
    total_count: u32,
    initial_side: u32,
    clockwise: bool,
) -> (f32, f32, WallDirection) {
    let perimeter = 2.0 * ((zone_width - radius * 2.0) + (zone_height - radius * 2.0));
    let mut distance = wall_index as f32 * perimeter / total_count as f32;

    let (mut x, mut y, mut direction) = match initial_side {
        0 => (
            zone_width / 2.0,
            radius,
            if clockwise { WallDirection::Left } else { WallDirection::Right },
        ),
        1 => (
            zone_width - radius,
            zone_height / 2.0,
            if clockwise { WallDirection::Up } else { WallDirection::Down },
        ),
        2 => (
            zone_width / 2.0,
            zone_height - radius,
            if clockwise { WallDirection::Right } else { WallDirection::Left },
        ),
        _ => (
            radius,
            zone_height / 2.0,
            if clockwise { WallDirection::Down } else { WallDirection::Up },
        ),
    };

    let mut guard = 0;
    while distance > 0.0 {
        guard += 1;
        if guard > 1000 {
            log::warn!("wall enemy placement watchdog tripped, aborting at current position");
            break;
        }
        match direction {
            WallDirection::Up => {
                let step = distance.min(y - radius);
                y -= step;
                distance -= step;
                if y <= radius {
                    y = radius;
                    direction = direction.rotate(clockwise);
                }
            }
            WallDirection::Right => {
                let step = distance.min((zone_width - radius) - x);
                x += step;
                distance -= step;
                if x >= zone_width - radius {
                    x = zone_width - radius;
                    direction = direction.rotate(clockwise);
                }
            }
            WallDirection::Down => {
                let step = distance.min((zone_height - radius) - y);
                y += step;
                distance -= step;
                if y >= zone_height - radius {
                    y = zone_height - radius;
                    direction = direction.rotate(clockwise);
                }
            }
            WallDirection::Left => {
                let step = distance.min(x - radius);
                x -= step;
                distance -= step;
                if x <= radius {
                    x = radius;
                    direction = direction.rotate(clockwise);
                }
            }
        }
    }

    (x, y, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn expander_hits_down_on_fifth() {
        let mut p = Player::new(1, Vector2::ZERO);
        for _ in 0..4 {
            assert!(!apply_expander_hit(&mut p));
        }
        assert!(apply_expander_hit(&mut p));
        assert_eq!(p.expander_hits, 0);
    }

    #[test]
    fn wavering_speed_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut e = Enemy::new_basic(1, EnemyVariant::Wavering, Vector2::ZERO, 5.0, 8.0, 0);
        e.min_speed = 3.0;
        e.max_speed = 15.0;
        e.velocity = Vector2::new(1.0, 0.0).scale(e.speed);
        for _ in 0..1000 {
            update_behavior(&mut e, 1.0 / 240.0, &mut rng);
            assert!(e.speed >= e.min_speed && e.speed <= e.max_speed);
        }
    }

    #[test]
    fn sniper_bullet_contact_downs_player() {
        assert!(matches!(
            contact_effect(EnemyVariant::SniperBullet),
            ContactEffect::Down
        ));
    }

    #[test]
    fn bullet_speed_is_two_point_five_times_sniper_speed() {
        let sniper = Enemy::new_basic(1, EnemyVariant::Sniper, Vector2::ZERO, 10.0, 100.0, 0);
        let target = Player::new(2, Vector2::new(50.0, 0.0));
        let bullet = spawn_bullet(99, &sniper, &target);
        assert_eq!(bullet.speed, 250.0);
        assert_eq!(bullet.radius, 5.0);
    }

    #[test]
    fn wall_enemy_placement_terminates_on_degenerate_zone() {
        let (x, y, _) = place_wall_enemy(1.0, 1.0, 10.0, 3, 4, 0, true);
        assert!(x.is_finite() && y.is_finite());
    }
}
