//! Player status lifecycle: Active / Downed / Cursed, plus the transient
//! per-tick Expanded radius growth and silenced/slowed flags.

use crate::geometry::Vector2;
use crate::protocol::PlayerStateMsg;

pub const DEFAULT_PLAYER_SPEED: f32 = 660.0;
pub const DEFAULT_PLAYER_RADIUS: f32 = 15.0;
pub const DOWNED_DURATION_SECONDS: u8 = 60;
pub const CURSED_DURATION_SECONDS: f32 = crate::enemy::CURSED_EFFECT_DURATION;
pub const SHIFT_SPEED_FACTOR: f32 = 0.5;
pub const SLOWED_SPEED_FACTOR: f32 = crate::enemy::SLOWING_SLOW_FACTOR;
pub const DIAGONAL_BOOST: f32 = std::f32::consts::SQRT_2;
pub const SLIDE_RETENTION: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Active,
    Downed,
    Cursed,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub position: Vector2,
    pub radius: f32,
    pub area_index: usize,

    pub status: PlayerStatus,
    pub downed_timer: f32,
    pub cursed_timer: f32,
    pub expander_hits: u8,

    /// Per-tick flags recomputed each tick, not part of the status machine.
    pub silenced: bool,
    pub slowed: bool,

    /// Residual movement carried from the previous tick (sliding/friction).
    pub slide: Vector2,
}

impl Player {
    pub fn new(id: u32, spawn: Vector2) -> Self {
        Player {
            id,
            position: spawn,
            radius: DEFAULT_PLAYER_RADIUS,
            area_index: 0,
            status: PlayerStatus::Active,
            downed_timer: 0.0,
            cursed_timer: 0.0,
            expander_hits: 0,
            silenced: false,
            slowed: false,
            slide: Vector2::ZERO,
        }
    }

    pub fn is_downed(&self) -> bool {
        self.status == PlayerStatus::Downed
    }

    pub fn is_cursed(&self) -> bool {
        self.status == PlayerStatus::Cursed
    }

    pub fn down(&mut self) {
        self.status = PlayerStatus::Downed;
        self.downed_timer = DOWNED_DURATION_SECONDS as f32;
    }

    pub fn curse(&mut self) {
        if self.status == PlayerStatus::Downed {
            return;
        }
        self.status = PlayerStatus::Cursed;
        self.cursed_timer = CURSED_DURATION_SECONDS;
    }

    pub fn clear_curse(&mut self) {
        if self.status == PlayerStatus::Cursed {
            self.status = PlayerStatus::Active;
            self.cursed_timer = 0.0;
        }
    }

    /// Revive is a no-op unless the player is actually downed. Clears the
    /// downed state in place; unlike `respawn`, it never moves the player.
    pub fn revive(&mut self) {
        if self.status != PlayerStatus::Downed {
            return;
        }
        self.status = PlayerStatus::Active;
        self.downed_timer = 0.0;
        self.radius = DEFAULT_PLAYER_RADIUS;
        self.expander_hits = 0;
    }

    pub fn respawn(&mut self, spawn: Vector2) {
        self.status = PlayerStatus::Active;
        self.downed_timer = 0.0;
        self.cursed_timer = 0.0;
        self.radius = DEFAULT_PLAYER_RADIUS;
        self.expander_hits = 0;
        self.position = spawn;
        self.slide = Vector2::ZERO;
    }

    pub fn effective_speed(&self) -> f32 {
        let mut speed = DEFAULT_PLAYER_SPEED;
        if self.slowed {
            speed *= SLOWED_SPEED_FACTOR;
        }
        speed
    }

    pub fn to_wire(&self) -> PlayerStateMsg {
        PlayerStateMsg {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius,
            is_downed: self.is_downed(),
            downed_timer: self.downed_timer.round().clamp(0.0, 255.0) as u8,
            is_cursed: self.is_cursed(),
            cursed_timer: self.cursed_timer.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revive_is_idempotent_when_not_downed() {
        let mut p = Player::new(1, Vector2::ZERO);
        p.revive();
        assert!(!p.is_downed());
        assert_eq!(p.position, Vector2::ZERO);
    }

    #[test]
    fn revive_leaves_position_unchanged() {
        let mut p = Player::new(1, Vector2::new(42.0, 7.0));
        p.down();
        p.revive();
        assert_eq!(p.position, Vector2::new(42.0, 7.0));
    }

    #[test]
    fn status_never_both_downed_and_cursed() {
        let mut p = Player::new(1, Vector2::ZERO);
        p.curse();
        assert!(p.is_cursed());
        p.down();
        assert!(p.is_downed());
        assert!(!p.is_cursed());
    }

    #[test]
    fn curse_on_downed_player_is_noop() {
        let mut p = Player::new(1, Vector2::ZERO);
        p.down();
        p.curse();
        assert!(p.is_downed());
        assert!(!p.is_cursed());
    }

    #[test]
    fn revive_resets_expander_radius() {
        let mut p = Player::new(1, Vector2::ZERO);
        p.radius = 35.0;
        p.expander_hits = 4;
        p.down();
        p.revive();
        assert_eq!(p.radius, DEFAULT_PLAYER_RADIUS);
        assert_eq!(p.expander_hits, 0);
    }
}
