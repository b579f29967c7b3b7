use ring_hash::Record;
use serde::{Deserialize, Serialize};

use crate::handle::PeerHandle;

/// Why a `teardown` or `reset-id` sweep was started. Absent for a plain
/// leader-initiated teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cause {
    Leave,
    Join,
}

/// A ring-internal message, exchanged directly between peers (never seen
/// by the manager). Carried inside a [`crate::Envelope::PeerMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command-type", rename_all = "kebab-case")]
pub enum PeerMessage {
    /// Sent by the leader to each other member during setup.
    SetId {
        identifier: usize,
        ring_size: usize,
        members: Vec<PeerHandle>,
    },
    /// Forwarded ring-wise until it reaches the node that owns `id`.
    Store {
        id: usize,
        entry: Record,
        year: u16,
    },
    /// Clears the local table; forwarded unless the receiver is the sweep's
    /// initiator (tracked by the peer's own transient flags, not by this
    /// message).
    Teardown { cause: Option<Cause> },
    /// Rotates ring membership one hop at a time during leave/join.
    ResetId {
        identifier: usize,
        cause: Cause,
        initiator: Option<PeerHandle>,
    },
    /// Drives a from-scratch rebuild of the local table at every node in
    /// the (already reshaped) ring. `hops_remaining == 0` is a sentinel for
    /// "not yet seeded"; the first real recipient fills it in from its own
    /// ring size, along with `members`, since only a post-reshape member has
    /// an up to date membership list to hand back to the sweep's origin.
    RebuildDht {
        origin: PeerHandle,
        hops_remaining: usize,
        new_leader: String,
        members: Vec<PeerHandle>,
    },
    /// A random-walk lookup for the record with the given event id.
    FindEvent {
        event_id: i64,
        #[serde(rename = "id-seq")]
        id_seq: Vec<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_event_uses_hyphenated_id_seq() {
        let message = PeerMessage::FindEvent {
            event_id: 10_120_412,
            id_seq: vec![0, 1],
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["command-type"], "find-event");
        assert_eq!(json["id-seq"], serde_json::json!([0, 1]));

        let back: PeerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn teardown_cause_is_optional() {
        let plain = PeerMessage::Teardown { cause: None };
        let json = serde_json::to_value(&plain).unwrap();
        let back: PeerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, plain);

        let leave = PeerMessage::Teardown {
            cause: Some(Cause::Leave),
        };
        let json = serde_json::to_value(&leave).unwrap();
        assert_eq!(json["cause"], "leave");
    }
}
