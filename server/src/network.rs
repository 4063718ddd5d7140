//! UDP transport: a receiver task decodes inbound datagrams onto a channel,
//! a sender task flushes outgoing packets, and the main select loop ticks
//! the simulation at the configured rate.

use crate::simulation::{Outgoing, SimulationState};
use log::{debug, error, info, warn};
use shared::protocol::{self, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

enum ServerMessage {
    PacketReceived(SocketAddr, Packet),
}

enum SendMessage {
    Unicast(SocketAddr, Vec<u8>),
    Broadcast(Vec<u8>),
}

pub struct Server {
    socket: Arc<UdpSocket>,
    simulation: Arc<RwLock<SimulationState>>,
    tick_duration: Duration,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    send_tx: mpsc::UnboundedSender<SendMessage>,
    send_rx: mpsc::UnboundedReceiver<SendMessage>,
}

impl Server {
    pub async fn new(
        bind_addr: &str,
        tick_duration: Duration,
        simulation: SimulationState,
    ) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind(bind_addr).await?;
        info!("listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (send_tx, send_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket: Arc::new(socket),
            simulation: Arc::new(RwLock::new(simulation)),
            tick_duration,
            server_tx,
            server_rx,
            send_tx,
            send_rx,
        })
    }

    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let tx = self.server_tx.clone();
        tokio::spawn(async move {
            let mut buf = [0u8; 65536];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, addr)) => match protocol::decode(&buf[..len]) {
                        Ok(packet) => {
                            if tx.send(ServerMessage::PacketReceived(addr, packet)).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("malformed packet from {addr}: {e}"),
                    },
                    Err(e) => {
                        error!("udp recv error: {e}");
                        break;
                    }
                }
            }
        });
    }

    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let simulation = Arc::clone(&self.simulation);
        let mut send_rx = std::mem::replace(&mut self.send_rx, mpsc::unbounded_channel().1);
        tokio::spawn(async move {
            while let Some(msg) = send_rx.recv().await {
                match msg {
                    SendMessage::Unicast(addr, bytes) => {
                        if let Err(e) = socket.send_to(&bytes, addr).await {
                            warn!("failed to send to {addr}: {e}");
                        }
                    }
                    SendMessage::Broadcast(bytes) => {
                        let addrs = simulation.read().await.clients.addrs();
                        for addr in addrs {
                            if let Err(e) = socket.send_to(&bytes, addr).await {
                                warn!("failed to send to {addr}: {e}");
                            }
                        }
                    }
                }
            }
        });
    }

    fn dispatch(&self, outgoing: Vec<Outgoing>) {
        for item in outgoing {
            match item {
                Outgoing::Unicast(addr, packet) => {
                    let bytes = protocol::encode(&packet);
                    let _ = self.send_tx.send(SendMessage::Unicast(addr, bytes));
                }
                Outgoing::Broadcast(packet) => {
                    let bytes = protocol::encode(&packet);
                    let _ = self.send_tx.send(SendMessage::Broadcast(bytes));
                }
            }
        }
    }

    pub async fn run(mut self) {
        self.spawn_network_receiver();
        self.spawn_network_sender();

        let mut tick_interval = tokio::time::interval(self.tick_duration);
        let dt = self.tick_duration.as_secs_f32();
        let mut tick_count: u64 = 0;

        loop {
            tokio::select! {
                Some(msg) = self.server_rx.recv() => {
                    match msg {
                        ServerMessage::PacketReceived(addr, packet) => {
                            let outgoing = self.simulation.write().await.handle_packet(addr, packet);
                            self.dispatch(outgoing);
                        }
                    }
                }
                _ = tick_interval.tick() => {
                    let outgoing = self.simulation.write().await.tick(dt);
                    self.dispatch(outgoing);
                    tick_count += 1;
                    if tick_count % (shared::DEFAULT_TICK_RATE_HZ as u64 * 10) == 0 {
                        let sim = self.simulation.read().await;
                        debug!("tick {} clients={} enemies={}", sim.tick, sim.clients.len(), sim.enemies.len());
                    }
                }
            }
        }
    }
}
