use serde::{Deserialize, Serialize};

/// A control message sent from a peer to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum ManagerRequest {
    Register {
        peer_name: String,
        #[serde(rename = "IPv4_address")]
        ipv4_address: String,
        m_port: u16,
        p_port: u16,
    },
    Deregister {
        peer_name: String,
    },
    SetupDht {
        peer_name: String,
        n: usize,
        #[serde(rename = "YYYY")]
        year: u16,
    },
    DhtComplete {
        peer_name: String,
    },
    TeardownDht {
        peer_name: String,
    },
    TeardownComplete {
        peer_name: String,
    },
    QueryDht {
        peer_name: String,
    },
    LeaveDht {
        peer_name: String,
    },
    JoinDht {
        peer_name: String,
    },
    DhtRebuilt {
        peer_name: String,
        new_leader: String,
    },
}

impl ManagerRequest {
    /// The peer making the request, present on every variant.
    pub fn peer_name(&self) -> &str {
        match self {
            ManagerRequest::Register { peer_name, .. }
            | ManagerRequest::Deregister { peer_name }
            | ManagerRequest::SetupDht { peer_name, .. }
            | ManagerRequest::DhtComplete { peer_name }
            | ManagerRequest::TeardownDht { peer_name }
            | ManagerRequest::TeardownComplete { peer_name }
            | ManagerRequest::QueryDht { peer_name }
            | ManagerRequest::LeaveDht { peer_name }
            | ManagerRequest::JoinDht { peer_name }
            | ManagerRequest::DhtRebuilt { peer_name, .. } => peer_name,
        }
    }
}
