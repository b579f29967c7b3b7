use serde::{Deserialize, Serialize};

/// The minimal handle for reaching a ring member: `(peer_name, ipv4_address,
/// p_port)`, called a "three-tuple" in the original design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerHandle {
    #[serde(rename = "peer_name")]
    pub name: String,
    #[serde(rename = "ip")]
    pub ip: String,
    #[serde(rename = "p_port")]
    pub p_port: u16,
}

impl PeerHandle {
    pub fn new(name: impl Into<String>, ip: impl Into<String>, p_port: u16) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            p_port,
        }
    }

    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.ip, self.p_port).parse()
    }
}
