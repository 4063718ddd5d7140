//! # Game Server Library
//!
//! Authoritative server for a real-time multiplayer top-down evasion game.
//! The server owns every position, collision, and status timer; clients
//! send input and render what gets broadcast back.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! [`simulation::SimulationState`] runs the fixed-rate tick: player
//! integration, map collision, the ten-variant enemy engine, contact
//! resolution, and status timers. All game logic decisions are made here.
//!
//! ### Client Management
//! [`client_manager::ClientManager`] tracks connected clients by address,
//! their latest-wins input slot, and the idle timeout sweep.
//!
//! ### Enemy Engine
//! [`enemy_engine`] holds the per-variant behavior functions and the
//! zone-scoped spawner/despawner, dispatched from `simulation` via a single
//! match on the enemy's tag rather than virtual dispatch.
//!
//! ### Network Transport
//! [`network::Server`] owns the UDP socket: one task decodes inbound
//! datagrams onto a channel, one task flushes outgoing packets, and the
//! main loop ticks the simulation on a fixed interval.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use shared::map::Map;
//! use server::network::Server;
//! use server::simulation::SimulationState;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let map = Arc::new(Map::fallback());
//!     let simulation = SimulationState::new(map, 0);
//!     let server = Server::new("0.0.0.0:12345", Duration::from_secs_f32(1.0 / 240.0), simulation).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Security Considerations
//!
//! ### Input Validation
//! Malformed or truncated datagrams are logged and dropped rather than
//! aborting the tick: no individual client's malformed packet may abort
//! the loop for everyone else.
//!
//! ### State Authority
//! The server maintains absolute authority over position, collision, and
//! status — there is no client prediction protocol to desync from.

pub mod client_manager;
pub mod enemy_engine;
pub mod network;
pub mod simulation;
