use ring_proto::PeerHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Free,
    InDht,
    Leader,
}

#[derive(Debug, Clone)]
pub struct PeerRecord {
    pub name: String,
    pub ip: String,
    pub m_port: u16,
    pub p_port: u16,
    pub state: PeerState,
}

impl PeerRecord {
    pub fn handle(&self) -> PeerHandle {
        PeerHandle::new(self.name.clone(), self.ip.clone(), self.p_port)
    }
}
