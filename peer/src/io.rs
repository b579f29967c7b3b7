use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use ring_proto::{Envelope, ManagerRequest, PeerHandle, PeerMessage};
use tokio::{net::UdpSocket, sync::Mutex};

use crate::error::PeerError;
use crate::ring::RingState;

/// Everything the dispatcher and the shell both need: the one socket, where
/// the manager lives, where the CSV fixtures live, and the shared ring
/// state. Cloning is cheap; every field is already reference-counted.
#[derive(Clone)]
pub struct Shared {
    pub socket: Arc<UdpSocket>,
    pub manager_addr: SocketAddr,
    pub csv_dir: PathBuf,
    pub state: Arc<Mutex<RingState>>,
}

impl Shared {
    pub async fn send_to_manager(&self, request: &ManagerRequest) -> Result<(), PeerError> {
        let bytes = ring_proto::encode(request)?;
        self.socket.send_to(&bytes, self.manager_addr).await?;
        Ok(())
    }

    pub async fn send_to_peer(&self, handle: &PeerHandle, message: PeerMessage) -> Result<(), PeerError> {
        let addr = handle.socket_addr()?;
        let bytes = ring_proto::encode(&Envelope::PeerMessage(message))?;
        self.socket.send_to(&bytes, addr).await?;
        Ok(())
    }

    /// Re-sends the exact bytes received off the wire, unchanged. Used for
    /// ring messages whose content is identical at every hop (`store`,
    /// `teardown`), per the raw re-send forwarding discipline (§4.4).
    pub async fn forward_raw(&self, handle: &PeerHandle, bytes: &[u8]) -> Result<(), PeerError> {
        let addr = handle.socket_addr()?;
        self.socket.send_to(bytes, addr).await?;
        Ok(())
    }
}
