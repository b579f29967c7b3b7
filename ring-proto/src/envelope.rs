use serde::{Deserialize, Serialize};

use crate::{peer_message::PeerMessage, reply::ManagerSuccess};

/// Everything a peer can receive on its one socket: a manager reply
/// (`SUCCESS`/`FAILURE`) or ring-internal traffic from another peer
/// (`PEER-MESSAGE`). The peer's single receive loop switches on this one
/// type, per the outer `status` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Envelope {
    #[serde(rename = "SUCCESS")]
    Success(ManagerSuccess),
    #[serde(rename = "FAILURE")]
    Failure { message: String },
    #[serde(rename = "PEER-MESSAGE")]
    PeerMessage(PeerMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_message_nests_under_peer_message_status() {
        let envelope = Envelope::PeerMessage(PeerMessage::FindEvent {
            event_id: 1,
            id_seq: vec![],
        });

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], "PEER-MESSAGE");
        assert_eq!(json["command-type"], "find-event");

        let back: Envelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn failure_decodes_without_command_type() {
        let json = serde_json::json!({"status": "FAILURE", "message": "nope"});
        let envelope: Envelope = serde_json::from_value(json).unwrap();
        assert!(matches!(envelope, Envelope::Failure { message } if message == "nope"));
    }
}
