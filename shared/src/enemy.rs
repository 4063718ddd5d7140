//! Enemy variants modeled as a tagged sum type rather than a class hierarchy:
//! one `Enemy` record carries every variant's state, and behavior dispatches
//! on `variant` instead of a virtual call + downcast.

use crate::geometry::Vector2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EnemyVariant {
    Normal = 0,
    Cursed = 1,
    Wall = 2,
    Slowing = 3,
    Immune = 4,
    Wavering = 5,
    Expander = 6,
    Silence = 7,
    Sniper = 8,
    SniperBullet = 9,
    Dasher = 10,
}

impl EnemyVariant {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => EnemyVariant::Normal,
            1 => EnemyVariant::Cursed,
            2 => EnemyVariant::Wall,
            3 => EnemyVariant::Slowing,
            4 => EnemyVariant::Immune,
            5 => EnemyVariant::Wavering,
            6 => EnemyVariant::Expander,
            7 => EnemyVariant::Silence,
            8 => EnemyVariant::Sniper,
            9 => EnemyVariant::SniperBullet,
            10 => EnemyVariant::Dasher,
            _ => return None,
        })
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "normal" => EnemyVariant::Normal,
            "cursed" => EnemyVariant::Cursed,
            "wall" => EnemyVariant::Wall,
            "slowing" => EnemyVariant::Slowing,
            "immune" => EnemyVariant::Immune,
            "wavering" => EnemyVariant::Wavering,
            "expander" => EnemyVariant::Expander,
            "silence" => EnemyVariant::Silence,
            "sniper" => EnemyVariant::Sniper,
            "sniper_bullet" => EnemyVariant::SniperBullet,
            "dasher" => EnemyVariant::Dasher,
            _ => return None,
        })
    }
}

/// Direction a `Wall` enemy currently travels along its zone's perimeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallDirection {
    Up,
    Right,
    Down,
    Left,
}

impl WallDirection {
    pub fn rotate(self, clockwise: bool) -> WallDirection {
        use WallDirection::*;
        match self {
            Up => if clockwise { Left } else { Right },
            Right => if clockwise { Up } else { Down },
            Down => if clockwise { Right } else { Left },
            Left => if clockwise { Down } else { Up },
        }
    }

    pub fn velocity(self, speed: f32) -> Vector2 {
        match self {
            WallDirection::Up => Vector2::new(0.0, -speed),
            WallDirection::Down => Vector2::new(0.0, speed),
            WallDirection::Right => Vector2::new(speed, 0.0),
            WallDirection::Left => Vector2::new(-speed, 0.0),
        }
    }
}

/// Three-phase cycle state for a `Dasher`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashPhase {
    Idle { time_since_last: f32 },
    Preparing { elapsed: f32 },
    Dashing { elapsed: f32 },
}

pub const DASHER_TIME_TO_PREPARE: f32 = 0.75;
pub const DASHER_TIME_TO_DASH: f32 = 3.0;
pub const DASHER_TIME_BETWEEN_DASHES: f32 = 0.75;
pub const DASHER_PREPARE_SPEED_FACTOR: f32 = 0.2;
pub const DASHER_BASE_SPEED_FACTOR: f32 = 0.2;

pub const SILENCE_AURA_RADIUS: f32 = 150.0;
pub const SILENCE_AURA_SHRINK_RATE: f32 = 1.1;
pub const SILENCE_AURA_GROW_RATE: f32 = 0.85;
pub const SILENCE_SMOOTHING_FACTOR: f32 = 0.1;
pub const SILENCE_EXIT_HYSTERESIS: f32 = 0.3;

pub const SLOWING_AURA_RADIUS: f32 = 150.0;
pub const SLOWING_SLOW_FACTOR: f32 = 0.7;

pub const SNIPER_RELEASE_TIME: f32 = 3.0;
pub const SNIPER_DETECTION_DISTANCE: f32 = 600.0;
pub const SNIPER_BULLET_SPEED_FACTOR: f32 = 2.5;

pub const SNIPER_BULLET_LIFETIME: f32 = 3.0;

pub const CURSED_EFFECT_DURATION: f32 = 1.5;
pub const CURSED_HARMLESS_DURATION: f32 = 1.5;
pub const EXPANDER_HARMLESS_DURATION: f32 = 1.5;
pub const EXPANDER_MAX_HITS: u8 = 5;
pub const EXPANDER_RADIUS_GROWTH: f32 = 5.0;

/// Variant-specific state. Fields that only one or two variants use are
/// grouped here rather than duplicated across separate structs, matching the
/// "tagged record" shape recommended for sum-type enemy modeling.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub variant: EnemyVariant,
    pub position: Vector2,
    pub velocity: Vector2,
    pub radius: f32,
    pub speed: f32,
    pub area_index: usize,

    pub is_harmless: bool,
    pub harmless_elapsed: f32,
    pub harmless_duration: f32,

    // Wall
    pub wall_direction: WallDirection,
    pub move_clockwise: bool,

    // Wavering
    pub min_speed: f32,
    pub max_speed: f32,
    pub speed_change_interval: f32,
    pub speed_increasing: bool,
    pub wavering_clock: f32,

    // Silence
    pub aura_size: f32,
    pub max_aura_size: f32,
    pub target_aura_size: f32,
    pub has_silenced_player: bool,
    pub player_in_aura_timer: f32,
    pub was_player_in_aura_last_frame: bool,

    // Sniper
    pub time_since_last_shot: f32,

    // SniperBullet
    pub time_lived: f32,
    pub angle: f32,

    // Dasher
    pub dash_phase: DashPhase,
    pub dasher_old_angle: f32,
    pub dasher_normal_speed: f32,
}

impl Enemy {
    pub fn new_basic(id: u32, variant: EnemyVariant, position: Vector2, radius: f32, speed: f32, area_index: usize) -> Self {
        Enemy {
            id,
            variant,
            position,
            velocity: Vector2::ZERO,
            radius,
            speed,
            area_index,
            is_harmless: false,
            harmless_elapsed: 0.0,
            harmless_duration: 0.0,
            wall_direction: WallDirection::Right,
            move_clockwise: true,
            min_speed: speed,
            max_speed: speed,
            speed_change_interval: 0.5,
            speed_increasing: true,
            wavering_clock: 0.0,
            aura_size: SILENCE_AURA_RADIUS,
            max_aura_size: SILENCE_AURA_RADIUS,
            target_aura_size: SILENCE_AURA_RADIUS,
            has_silenced_player: false,
            player_in_aura_timer: 0.0,
            was_player_in_aura_last_frame: false,
            time_since_last_shot: 0.0,
            time_lived: 0.0,
            angle: 0.0,
            dash_phase: DashPhase::Idle {
                time_since_last: 0.0,
            },
            dasher_old_angle: 0.0,
            dasher_normal_speed: speed,
        }
    }

    pub fn set_harmless(&mut self, duration: f32) {
        self.is_harmless = true;
        self.harmless_elapsed = 0.0;
        self.harmless_duration = duration;
    }

    /// `1.0` when freshly harmless, decaying to `0.0` as the window elapses.
    pub fn harmless_progress(&self) -> f32 {
        if !self.is_harmless || self.harmless_duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.harmless_elapsed / self.harmless_duration).clamp(0.0, 1.0)
    }

    pub fn tick_harmless(&mut self, dt: f32) {
        if self.is_harmless {
            self.harmless_elapsed += dt;
            if self.harmless_elapsed >= self.harmless_duration {
                self.is_harmless = false;
            }
        }
    }
}
