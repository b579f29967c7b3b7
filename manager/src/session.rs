use std::collections::HashMap;

use ring_proto::{ManagerRequest, ManagerSuccess};
use ring_rand::Source;

use crate::error::ManagerError;
use crate::ports::PortAllocator;
use crate::registry::{PeerRecord, PeerState};

/// The manager's whole mutable state: peer registry, port reservations, and
/// the session-phase flags that gate which commands are accepted.
///
/// Every call runs to completion before the next is accepted (see the
/// concurrency model: the manager is a single-threaded receive/dispatch/reply
/// loop), so no internal locking is needed here.
pub struct Session {
    peers: HashMap<String, PeerRecord>,
    ports: PortAllocator,
    rng: Source,
    leader: Option<String>,
    dht_exists: bool,
    dht_ready: bool,
    teardown_in_progress: bool,
    /// Set by a successful `leave-dht`; cleared (and the named peer
    /// deregistered) when the matching `dht-rebuilt` arrives. See DESIGN.md
    /// for why this is tracked separately from `ManagerRequest::DhtRebuilt`'s
    /// own `peer_name` field.
    pending_leaver: Option<String>,
}

impl Session {
    pub fn new(min_port: u16, max_port: u16, rng: Source) -> Self {
        Self {
            peers: HashMap::new(),
            ports: PortAllocator::new(min_port, max_port),
            rng,
            leader: None,
            dht_exists: false,
            dht_ready: false,
            teardown_in_progress: false,
            pending_leaver: None,
        }
    }

    #[cfg(test)]
    pub fn peer_state(&self, name: &str) -> Option<PeerState> {
        self.peers.get(name).map(|p| p.state)
    }

    #[cfg(test)]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    fn check_gates(&self, request: &ManagerRequest) -> Result<(), ManagerError> {
        if self.teardown_in_progress && !matches!(request, ManagerRequest::TeardownComplete { .. })
        {
            return Err(ManagerError::TeardownInProgress);
        }
        if self.dht_exists
            && !self.dht_ready
            && !matches!(request, ManagerRequest::DhtComplete { .. })
        {
            return Err(ManagerError::DhtSetupInProgress);
        }
        Ok(())
    }

    pub fn handle(&mut self, request: ManagerRequest) -> Result<ManagerSuccess, ManagerError> {
        self.check_gates(&request)?;

        match request {
            ManagerRequest::Register {
                peer_name,
                ipv4_address,
                m_port,
                p_port,
            } => self.register(peer_name, ipv4_address, m_port, p_port),
            ManagerRequest::Deregister { peer_name } => self.deregister(&peer_name),
            ManagerRequest::SetupDht { peer_name, n, year } => {
                self.setup_dht(&peer_name, n, year)
            }
            ManagerRequest::DhtComplete { peer_name } => self.dht_complete(&peer_name),
            ManagerRequest::TeardownDht { peer_name } => self.teardown_dht(&peer_name),
            ManagerRequest::TeardownComplete { peer_name } => self.teardown_complete(&peer_name),
            ManagerRequest::QueryDht { peer_name } => self.query_dht(&peer_name),
            ManagerRequest::LeaveDht { peer_name } => self.leave_dht(&peer_name),
            ManagerRequest::JoinDht { peer_name } => self.join_dht(&peer_name),
            ManagerRequest::DhtRebuilt {
                peer_name,
                new_leader,
            } => self.dht_rebuilt(&peer_name, &new_leader),
        }
    }

    fn register(
        &mut self,
        name: String,
        ip: String,
        m_port: u16,
        p_port: u16,
    ) -> Result<ManagerSuccess, ManagerError> {
        if self.peers.contains_key(&name) {
            return Err(ManagerError::NameCollision(name));
        }
        if !self.ports.is_available(m_port) {
            return Err(ManagerError::PortOutOfRange(m_port));
        }
        if !self.ports.is_available(p_port) {
            return Err(ManagerError::PortOutOfRange(p_port));
        }

        self.ports.reserve(m_port)?;
        self.ports.reserve(p_port)?;
        self.peers.insert(
            name.clone(),
            PeerRecord {
                name,
                ip,
                m_port,
                p_port,
                state: PeerState::Free,
            },
        );
        Ok(ManagerSuccess::Register)
    }

    fn deregister(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        let peer = self
            .peers
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPeer(name.to_string()))?;
        if peer.state != PeerState::Free {
            return Err(ManagerError::WrongState(name.to_string()));
        }

        let peer = self.peers.remove(name).expect("checked above");
        self.ports.release(peer.m_port);
        self.ports.release(peer.p_port);
        Ok(ManagerSuccess::Deregister)
    }

    fn setup_dht(&mut self, name: &str, n: usize, _year: u16) -> Result<ManagerSuccess, ManagerError> {
        if !self.peers.contains_key(name) {
            return Err(ManagerError::UnknownPeer(name.to_string()));
        }
        if n < 3 {
            return Err(ManagerError::DhtTooSmall(n));
        }
        if self.peers.len() < n {
            return Err(ManagerError::NotEnoughFreePeers {
                requested: n,
                available: self.peers.len(),
            });
        }
        if self.dht_exists {
            return Err(ManagerError::DhtAlreadyExists);
        }
        let requester = &self.peers[name];
        if requester.state != PeerState::Free {
            return Err(ManagerError::WrongState(name.to_string()));
        }

        let free_others: Vec<&str> = self
            .peers
            .values()
            .filter(|p| p.state == PeerState::Free && p.name != name)
            .map(|p| p.name.as_str())
            .collect();
        if free_others.len() + 1 < n {
            return Err(ManagerError::NotEnoughFreePeers {
                requested: n,
                available: free_others.len() + 1,
            });
        }

        let chosen: Vec<String> = self
            .rng
            .sample_without_replacement(&free_others, n - 1)
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        self.peers.get_mut(name).expect("checked above").state = PeerState::Leader;
        for peer_name in &chosen {
            self.peers.get_mut(peer_name).expect("sampled from map").state = PeerState::InDht;
        }

        self.leader = Some(name.to_string());
        self.dht_exists = true;
        self.dht_ready = false;

        let mut members = vec![self.peers[name].handle()];
        members.extend(chosen.iter().map(|n| self.peers[n].handle()));

        Ok(ManagerSuccess::SetupDht { members, size: n })
    }

    fn require_leader(&self, name: &str) -> Result<(), ManagerError> {
        if self.leader.as_deref() != Some(name) {
            return Err(ManagerError::NotLeader(name.to_string()));
        }
        Ok(())
    }

    fn dht_complete(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        self.require_leader(name)?;
        self.dht_ready = true;
        Ok(ManagerSuccess::DhtComplete)
    }

    fn teardown_dht(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        self.require_leader(name)?;
        self.teardown_in_progress = true;
        Ok(ManagerSuccess::TeardownDht)
    }

    fn teardown_complete(&mut self, _name: &str) -> Result<ManagerSuccess, ManagerError> {
        self.teardown_in_progress = false;
        self.dht_exists = false;
        self.dht_ready = false;
        self.leader = None;
        self.pending_leaver = None;
        for peer in self.peers.values_mut() {
            if peer.state != PeerState::Free {
                peer.state = PeerState::Free;
            }
        }
        Ok(ManagerSuccess::TeardownComplete)
    }

    fn query_dht(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        if !self.dht_ready {
            return Err(ManagerError::DhtSetupInProgress);
        }
        let requester = self
            .peers
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPeer(name.to_string()))?;
        if requester.state != PeerState::Free {
            return Err(ManagerError::WrongState(name.to_string()));
        }

        let members: Vec<&PeerRecord> = self
            .peers
            .values()
            .filter(|p| p.state == PeerState::InDht)
            .collect();
        let chosen = self
            .rng
            .choose(&members)
            .ok_or(ManagerError::NotEnoughFreePeers {
                requested: 1,
                available: 0,
            })?;

        Ok(ManagerSuccess::QueryDht {
            peer_name: chosen.name.clone(),
            addr: chosen.ip.clone(),
            p_port: chosen.p_port,
        })
    }

    fn leave_dht(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        let peer = self
            .peers
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPeer(name.to_string()))?;
        if peer.state != PeerState::InDht {
            return Err(ManagerError::WrongState(name.to_string()));
        }
        self.pending_leaver = Some(name.to_string());
        Ok(ManagerSuccess::LeaveDht)
    }

    fn join_dht(&mut self, name: &str) -> Result<ManagerSuccess, ManagerError> {
        if !self.dht_ready {
            return Err(ManagerError::DhtSetupInProgress);
        }
        let peer = self
            .peers
            .get(name)
            .ok_or_else(|| ManagerError::UnknownPeer(name.to_string()))?;
        if peer.state != PeerState::Free {
            return Err(ManagerError::WrongState(name.to_string()));
        }

        let old_leader_name = self
            .leader
            .clone()
            .ok_or(ManagerError::NotLeader(name.to_string()))?;
        let old_leader_handle = self.peers[&old_leader_name].handle();

        self.peers.get_mut(&old_leader_name).expect("leader exists").state = PeerState::InDht;
        self.peers.get_mut(name).expect("checked above").state = PeerState::Leader;
        self.leader = Some(name.to_string());

        Ok(ManagerSuccess::JoinDht {
            peer_name: old_leader_handle.name,
            addr: old_leader_handle.ip,
            p_port: old_leader_handle.p_port,
        })
    }

    fn dht_rebuilt(&mut self, _name: &str, new_leader: &str) -> Result<ManagerSuccess, ManagerError> {
        if let Some(leaver) = self.pending_leaver.take() {
            if let Some(peer) = self.peers.remove(&leaver) {
                self.ports.release(peer.m_port);
                self.ports.release(peer.p_port);
            }
        }
        if self.peers.contains_key(new_leader) {
            self.leader = Some(new_leader.to_string());
        }
        Ok(ManagerSuccess::DhtRebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(15000, 15499, Source::from_seed(7))
    }

    fn register(session: &mut Session, name: &str, p_port: u16) {
        session
            .handle(ManagerRequest::Register {
                peer_name: name.to_string(),
                ipv4_address: "127.0.0.1".to_string(),
                m_port: p_port + 1000,
                p_port,
            })
            .unwrap();
    }

    #[test]
    fn register_then_deregister_round_trips() {
        let mut session = session();
        register(&mut session, "apple", 15002);
        assert_eq!(session.peer_count(), 1);

        session
            .handle(ManagerRequest::Deregister {
                peer_name: "apple".to_string(),
            })
            .unwrap();
        assert_eq!(session.peer_count(), 0);
    }

    #[test]
    fn register_rejects_name_collision() {
        let mut session = session();
        register(&mut session, "apple", 15002);
        let err = session
            .handle(ManagerRequest::Register {
                peer_name: "apple".to_string(),
                ipv4_address: "127.0.0.1".to_string(),
                m_port: 15010,
                p_port: 15011,
            })
            .unwrap_err();
        assert!(matches!(err, ManagerError::NameCollision(_)));
    }

    #[test]
    fn setup_dht_assigns_leader_and_members() {
        let mut session = session();
        for (name, port) in [("a", 15002), ("b", 15004), ("c", 15006), ("d", 15008)] {
            register(&mut session, name, port);
        }

        let reply = session
            .handle(ManagerRequest::SetupDht {
                peer_name: "a".to_string(),
                n: 3,
                year: 1950,
            })
            .unwrap();

        match reply {
            ManagerSuccess::SetupDht { members, size } => {
                assert_eq!(size, 3);
                assert_eq!(members.len(), 3);
                assert_eq!(members[0].name, "a");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        assert_eq!(session.peer_state("a"), Some(PeerState::Leader));
    }

    #[test]
    fn setup_dht_rejects_too_small_n() {
        let mut session = session();
        register(&mut session, "a", 15002);
        let err = session
            .handle(ManagerRequest::SetupDht {
                peer_name: "a".to_string(),
                n: 2,
                year: 1950,
            })
            .unwrap_err();
        assert!(matches!(err, ManagerError::DhtTooSmall(2)));
    }

    #[test]
    fn gating_blocks_other_commands_while_setup_incomplete() {
        let mut session = session();
        for (name, port) in [("a", 15002), ("b", 15004), ("c", 15006)] {
            register(&mut session, name, port);
        }
        session
            .handle(ManagerRequest::SetupDht {
                peer_name: "a".to_string(),
                n: 3,
                year: 1950,
            })
            .unwrap();

        let err = session
            .handle(ManagerRequest::QueryDht {
                peer_name: "a".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ManagerError::DhtSetupInProgress));

        session
            .handle(ManagerRequest::DhtComplete {
                peer_name: "a".to_string(),
            })
            .unwrap();
        assert!(session.dht_ready);
    }

    #[test]
    fn teardown_complete_resets_every_member_to_free() {
        let mut session = session();
        for (name, port) in [("a", 15002), ("b", 15004), ("c", 15006)] {
            register(&mut session, name, port);
        }
        session
            .handle(ManagerRequest::SetupDht {
                peer_name: "a".to_string(),
                n: 3,
                year: 1950,
            })
            .unwrap();
        session
            .handle(ManagerRequest::DhtComplete {
                peer_name: "a".to_string(),
            })
            .unwrap();
        session
            .handle(ManagerRequest::TeardownDht {
                peer_name: "a".to_string(),
            })
            .unwrap();
        session
            .handle(ManagerRequest::TeardownComplete {
                peer_name: "a".to_string(),
            })
            .unwrap();

        assert_eq!(session.peer_state("a"), Some(PeerState::Free));
        assert_eq!(session.peer_state("b"), Some(PeerState::Free));
        assert_eq!(session.peer_state("c"), Some(PeerState::Free));
        assert!(!session.dht_exists);
    }

    #[test]
    fn dht_rebuilt_deregisters_the_pending_leaver() {
        let mut session = session();
        for (name, port) in [("a", 15002), ("b", 15004), ("c", 15006)] {
            register(&mut session, name, port);
        }
        session
            .handle(ManagerRequest::SetupDht {
                peer_name: "a".to_string(),
                n: 3,
                year: 1950,
            })
            .unwrap();
        session
            .handle(ManagerRequest::DhtComplete {
                peer_name: "a".to_string(),
            })
            .unwrap();

        let leaver = ["b", "c"]
            .into_iter()
            .find(|n| session.peer_state(n) == Some(PeerState::InDht))
            .unwrap();

        session
            .handle(ManagerRequest::LeaveDht {
                peer_name: leaver.to_string(),
            })
            .unwrap();
        assert_eq!(session.peer_count(), 3);

        session
            .handle(ManagerRequest::DhtRebuilt {
                peer_name: "a".to_string(),
                new_leader: "a".to_string(),
            })
            .unwrap();
        assert_eq!(session.peer_count(), 2);
        assert!(session.peers.get(leaver).is_none());
    }
}
