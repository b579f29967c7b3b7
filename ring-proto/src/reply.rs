use serde::{Deserialize, Serialize};

use crate::handle::PeerHandle;

/// The payload of a `SUCCESS` reply. The variant tag (`command-type`) echoes
/// the request that succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command-type", rename_all = "kebab-case")]
pub enum ManagerSuccess {
    Register,
    Deregister,
    SetupDht {
        members: Vec<PeerHandle>,
        size: usize,
    },
    DhtComplete,
    TeardownDht,
    TeardownComplete,
    QueryDht {
        #[serde(rename = "peer-name")]
        peer_name: String,
        addr: String,
        #[serde(rename = "p-port")]
        p_port: u16,
    },
    LeaveDht,
    JoinDht {
        #[serde(rename = "peer-name")]
        peer_name: String,
        addr: String,
        #[serde(rename = "p-port")]
        p_port: u16,
    },
    DhtRebuilt,
}

/// A manager reply: either `SUCCESS` (carrying a [`ManagerSuccess`]) or
/// `FAILURE` (carrying an operator-facing message).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ManagerReply {
    #[serde(rename = "SUCCESS")]
    Success(ManagerSuccess),
    #[serde(rename = "FAILURE")]
    Failure { message: String },
}

impl ManagerReply {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
