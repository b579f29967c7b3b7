//! Random-walk `find-event` lookups (§4.6).

use ring_rand::Source;
use ring_proto::PeerMessage;

use crate::error::PeerError;
use crate::io::Shared;
use crate::ring::RingState;

/// Kick off a lookup against a ring member the manager handed us.
pub async fn start_find_event(shared: &Shared, target: &ring_proto::PeerHandle, event_id: i64) -> Result<(), PeerError> {
    shared
        .send_to_peer(
            target,
            PeerMessage::FindEvent {
                event_id,
                id_seq: Vec::new(),
            },
        )
        .await
}

/// Outcome of a node trying to answer `find-event` locally.
pub enum Lookup {
    Hit(ring_hash::Record),
    Forward(PeerMessage, ring_proto::PeerHandle),
    NotFound,
}

/// What a ring node does with an incoming `find-event` (§4.6, steps 1-3).
/// `rng` drives the uniform-random choice among not-yet-visited nodes.
pub fn resolve(state: &RingState, event_id: i64, id_seq: &[usize], rng: &mut Source) -> Lookup {
    let table_size = state.table_size.max(1);
    let placement = ring_hash::place(event_id, table_size, state.ring_size.max(1));

    if placement.node == state.identifier {
        return match state
            .table
            .iter()
            .find(|record| record.event_id().ok() == Some(event_id))
        {
            Some(record) => Lookup::Hit(record.clone()),
            None => Lookup::NotFound,
        };
    }

    let mut visited = id_seq.to_vec();
    visited.push(state.identifier);

    let remaining: Vec<usize> = (0..state.ring_size)
        .filter(|candidate| !visited.contains(candidate))
        .collect();

    match rng.choose(&remaining) {
        Some(&next) => {
            let message = PeerMessage::FindEvent {
                event_id,
                id_seq: visited,
            };
            let handle = state.members[next].clone();
            Lookup::Forward(message, handle)
        }
        None => Lookup::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring_hash::{Record, FIELD_COUNT};
    use ring_proto::PeerHandle;

    fn ring_of(size: usize, identifier: usize, table_size: u64, table: Vec<Record>) -> RingState {
        let members: Vec<PeerHandle> = (0..size)
            .map(|i| PeerHandle::new(format!("p{i}"), "127.0.0.1", 15002 + i as u16))
            .collect();
        let mut state = RingState::new(members[identifier].clone());
        state.install_set_id(identifier, size, members);
        state.table_size = table_size;
        state.table = table;
        state
    }

    fn record(event_id: i64) -> Record {
        let mut fields = vec![String::new(); FIELD_COUNT];
        fields[0] = event_id.to_string();
        Record::new(fields).unwrap()
    }

    #[test]
    fn hits_when_record_is_local() {
        // s = 11, event_id 10_120_412 -> pos 8, node 8 % 3 = 2.
        let state = ring_of(3, 2, 11, vec![record(10_120_412)]);
        let mut rng = Source::from_seed(1);
        match resolve(&state, 10_120_412, &[], &mut rng) {
            Lookup::Hit(record) => assert_eq!(record.event_id().unwrap(), 10_120_412),
            _ => panic!("expected a hit"),
        }
    }

    #[test]
    fn misses_when_local_but_absent() {
        let state = ring_of(3, 2, 11, vec![]);
        let mut rng = Source::from_seed(1);
        assert!(matches!(
            resolve(&state, 10_120_412, &[], &mut rng),
            Lookup::NotFound
        ));
    }

    #[test]
    fn forwards_to_an_unvisited_node() {
        let state = ring_of(3, 0, 11, vec![]);
        let mut rng = Source::from_seed(1);
        match resolve(&state, 10_120_412, &[], &mut rng) {
            Lookup::Forward(_, handle) => assert_ne!(handle.name, "p0"),
            _ => panic!("expected a forward"),
        }
    }

    #[test]
    fn gives_up_once_every_node_is_visited() {
        let state = ring_of(3, 0, 11, vec![]);
        let mut rng = Source::from_seed(1);
        assert!(matches!(
            resolve(&state, 10_120_412, &[0, 1, 2], &mut rng),
            Lookup::NotFound
        ));
    }
}
