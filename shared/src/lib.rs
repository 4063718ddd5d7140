//! Types and wire codec shared between the simulation server and any client:
//! geometry primitives, the map model and loader, the player status machine,
//! the enemy variant model, and the UDP packet encoding.

pub mod enemy;
pub mod geometry;
pub mod map;
pub mod player;
pub mod protocol;

pub const DEFAULT_TICK_RATE_HZ: u32 = 240;
pub const CLIENT_TIMEOUT_SECONDS: f32 = 10.0;
pub const HOUSEKEEPING_INTERVAL_SECONDS: f32 = 5.0;
