//! Client session table: address bookkeeping, the latest-wins input slot,
//! and the idle timeout sweep. Each client keeps only its newest input —
//! UDP drops and reorders are tolerated by the snapshot broadcasts, so
//! there is nothing to reconcile against.

use shared::player::Player;
use shared::protocol::PlayerInput;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    pub last_seen: Instant,
    pub player: Player,
    pub latest_input: Option<PlayerInput>,
}

impl Client {
    fn new(id: u32, addr: SocketAddr, player: Player) -> Self {
        Client {
            id,
            addr,
            last_seen: Instant::now(),
            player,
            latest_input: None,
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
}

impl ClientManager {
    pub fn new() -> Self {
        ClientManager {
            clients: HashMap::new(),
            next_client_id: 1,
        }
    }

    pub fn add_client(&mut self, addr: SocketAddr, player: Player) -> u32 {
        let id = self.next_client_id;
        self.next_client_id += 1;
        let player = Player { id, ..player };
        self.clients.insert(id, Client::new(id, addr, player));
        id
    }

    pub fn remove_client(&mut self, id: u32) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn find_by_addr(&self, addr: &SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, c)| &c.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn get(&self, id: u32) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn set_input(&mut self, id: u32, input: PlayerInput) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.latest_input = Some(input);
            client.touch();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut()
    }

    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.clients.values().map(|c| c.addr).collect()
    }

    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .values()
            .filter(|c| c.is_timed_out(timeout))
            .map(|c| c.id)
            .collect();
        for id in &timed_out {
            self.clients.remove(id);
        }
        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::geometry::Vector2;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn add_client_assigns_increasing_ids() {
        let mut mgr = ClientManager::new();
        let a = mgr.add_client(addr(1000), Player::new(0, Vector2::ZERO));
        let b = mgr.add_client(addr(1001), Player::new(0, Vector2::ZERO));
        assert!(b > a);
    }

    #[test]
    fn remove_then_readd_does_not_reuse_id() {
        let mut mgr = ClientManager::new();
        let a = mgr.add_client(addr(1000), Player::new(0, Vector2::ZERO));
        mgr.remove_client(a);
        let b = mgr.add_client(addr(1000), Player::new(0, Vector2::ZERO));
        assert_ne!(a, b);
    }

    #[test]
    fn find_by_addr_locates_client() {
        let mut mgr = ClientManager::new();
        let id = mgr.add_client(addr(2000), Player::new(0, Vector2::ZERO));
        assert_eq!(mgr.find_by_addr(&addr(2000)), Some(id));
        assert_eq!(mgr.find_by_addr(&addr(2001)), None);
    }

    #[test]
    fn timeout_sweep_removes_only_stale_clients() {
        let mut mgr = ClientManager::new();
        let id = mgr.add_client(addr(3000), Player::new(0, Vector2::ZERO));
        mgr.get_mut(id).unwrap().last_seen = Instant::now() - Duration::from_secs(20);
        let removed = mgr.check_timeouts(Duration::from_secs(10));
        assert_eq!(removed, vec![id]);
        assert!(mgr.get(id).is_none());
    }
}
