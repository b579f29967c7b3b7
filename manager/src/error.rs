use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("teardown in progress")]
    TeardownInProgress,
    #[error("DHT setup in progress")]
    DhtSetupInProgress,
    #[error("peer '{0}' is already registered")]
    NameCollision(String),
    #[error("peer '{0}' is not registered")]
    UnknownPeer(String),
    #[error("port {0} is out of the allowed range")]
    PortOutOfRange(u16),
    #[error("port {0} is already reserved")]
    PortAlreadyReserved(u16),
    #[error("peer '{0}' is not in the required state for this operation")]
    WrongState(String),
    #[error("a DHT of size {requested} cannot be built from {available} free peers")]
    NotEnoughFreePeers { requested: usize, available: usize },
    #[error("DHT size must be at least 3, got {0}")]
    DhtTooSmall(usize),
    #[error("a DHT already exists")]
    DhtAlreadyExists,
    #[error("peer '{0}' is not the current leader")]
    NotLeader(String),
}

impl ManagerError {
    /// The operator-facing text carried in a `FAILURE` reply.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
