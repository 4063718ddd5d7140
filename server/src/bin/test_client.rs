//! Manual UDP smoke-test client: connects, sends a handful of input
//! frames, and disconnects, printing whatever the server broadcasts back.
//! Exercises the wire protocol without any rendering surface.

use clap::Parser;
use shared::protocol::{decode, encode, InputBits, Packet, PlayerInput};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::sleep;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    server: String,

    #[arg(long, default_value_t = 12345)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let server_addr: SocketAddr = format!("{}:{}", args.server, args.port).parse()?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("bound local socket {}", socket.local_addr()?);

    socket.send_to(&encode(&Packet::PlayerConnect), server_addr).await?;
    println!("sent PlayerConnect to {server_addr}");

    let mut buf = [0u8; 65536];

    let (len, _) = socket.recv_from(&mut buf).await?;
    match decode(&buf[..len])? {
        Packet::MapData(json) => println!("received map data ({} bytes)", json.len()),
        other => println!("expected MapData, got {other:?}"),
    }

    let (len, _) = socket.recv_from(&mut buf).await?;
    match decode(&buf[..len])? {
        Packet::GameState { tick, players } => {
            println!("initial game state: tick={tick} players={}", players.len());
        }
        other => println!("expected GameState, got {other:?}"),
    }

    for i in 0..10 {
        let bits = InputBits {
            move_right: i % 2 == 0,
            move_down: i % 2 == 1,
            ..Default::default()
        };
        let packet = Packet::PlayerInput(PlayerInput {
            bits,
            mouse: None,
            joystick: None,
        });
        socket.send_to(&encode(&packet), server_addr).await?;

        match socket.recv_from(&mut buf).await {
            Ok((len, _)) => match decode(&buf[..len]) {
                Ok(Packet::GameState { tick, players }) => {
                    println!("tick {tick}: {} player(s)", players.len());
                    for p in &players {
                        println!("  player {}: ({:.1}, {:.1})", p.id, p.x, p.y);
                    }
                }
                Ok(other) => println!("unexpected packet: {other:?}"),
                Err(e) => println!("failed to decode: {e}"),
            },
            Err(e) => println!("recv error: {e}"),
        }

        sleep(Duration::from_millis(200)).await;
    }

    socket.send_to(&encode(&Packet::PlayerDisconnect), server_addr).await?;
    println!("sent PlayerDisconnect, smoke test complete");

    Ok(())
}
