use thiserror::Error;

use crate::dht::DhtError;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("failed to resolve a peer's address")]
    Addr(#[from] std::net::AddrParseError),
    #[error("failed to encode or decode a message")]
    Codec(#[from] ring_proto::CodecError),
    #[error("socket I/O failed")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Dht(#[from] DhtError),
    #[error("peer name must be alphabetic and at most 15 characters, got {0:?}")]
    InvalidPeerName(String),
}
