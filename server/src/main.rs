use clap::Parser;
use log::{error, info, warn};
use shared::map::Map;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use server::network::Server;
use server::simulation::SimulationState;

/// Authoritative server for a real-time multiplayer evasion game.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// UDP port to listen on.
    #[arg(long, default_value_t = 12345)]
    port: u16,

    /// Path to a map JSON file. Falls back to a minimal built-in map if
    /// omitted or unreadable.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Simulation tick rate in Hz.
    #[arg(long, default_value_t = shared::DEFAULT_TICK_RATE_HZ)]
    tick_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = Args::parse();

    let map = match &args.map {
        Some(path) => match Map::load_from_path(path) {
            Ok(map) => {
                info!("loaded map '{}' from {}", map.name, path.display());
                map
            }
            Err(e) => {
                warn!("failed to load map {}: {e}; using fallback map", path.display());
                Map::fallback()
            }
        },
        None => {
            info!("no --map given, using fallback map");
            Map::fallback()
        }
    };

    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate as f64);
    let simulation = SimulationState::new(Arc::new(map), rand::random());

    let bind_addr = format!("0.0.0.0:{}", args.port);
    let server = match Server::new(&bind_addr, tick_duration, simulation).await {
        Ok(server) => server,
        Err(e) => {
            error!("failed to bind udp socket on {bind_addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("tick rate {} Hz", args.tick_rate);
    server.run().await;
    Ok(())
}
