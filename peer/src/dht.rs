use ring_hash::{DatasetError, DatasetSource, RecordError};
use ring_proto::PeerMessage;
use thiserror::Error;

use crate::ring::RingState;

#[derive(Debug, Error)]
pub enum DhtError {
    #[error("failed to load the dataset")]
    Dataset(#[from] DatasetError),
    #[error("record has a malformed event id")]
    BadRecord(#[from] RecordError),
}

/// Runs the two-level hash (§4.4) over the dataset for `year` and places
/// every record: records owned by this node land in `state.table` directly;
/// everything else comes back as an outbound `store` the caller must forward
/// to the right neighbor (this function does no I/O of its own).
pub fn build(
    state: &mut RingState,
    dataset: &dyn DatasetSource,
    year: u16,
) -> Result<Vec<PeerMessage>, DhtError> {
    let records = dataset.load(year)?;
    let record_count = records.len();
    let table_size = ring_hash::table_size(record_count);

    state.record_count = record_count;
    state.table_size = table_size;
    state.year_used = Some(year);
    state.table.clear();

    let mut outbound = Vec::new();
    for record in records {
        let event_id = record.event_id()?;
        let placement = ring_hash::place(event_id, table_size, state.ring_size);
        if placement.node == state.identifier {
            state.table.push(record);
        } else {
            outbound.push(PeerMessage::Store {
                id: placement.node,
                entry: record,
                year,
            });
        }
    }

    tracing::info!(stored = state.table.len(), total = record_count, "built local DHT table");
    Ok(outbound)
}

/// Learns `table_size`/`record_count` for `year` without placing any
/// records. Used by a non-leader node the first time it owns a `store` for a
/// year it hasn't built locally, so its own placement-side `s` agrees with
/// the leader's (§9, "the placement-side `s` must be used uniformly").
pub fn size_for_year(dataset: &dyn DatasetSource, year: u16) -> Result<(u64, usize), DhtError> {
    let records = dataset.load(year)?;
    let record_count = records.len();
    Ok((ring_hash::table_size(record_count), record_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring_hash::{InMemoryDatasetSource, Record, FIELD_COUNT};
    use ring_proto::PeerHandle;

    fn record(event_id: i64) -> Record {
        let mut fields = vec![String::new(); FIELD_COUNT];
        fields[0] = event_id.to_string();
        Record::new(fields).unwrap()
    }

    #[test]
    fn every_record_ends_up_local_or_outbound() {
        let mut state = RingState::new(PeerHandle::new("a", "127.0.0.1", 15002));
        state.install_set_id(
            0,
            3,
            vec![
                PeerHandle::new("a", "127.0.0.1", 15002),
                PeerHandle::new("b", "127.0.0.1", 15004),
                PeerHandle::new("c", "127.0.0.1", 15006),
            ],
        );

        let records: Vec<Record> = (0..20).map(record).collect();
        let dataset = InMemoryDatasetSource::new(records.clone());

        let outbound = build(&mut state, &dataset, 1950).unwrap();
        assert_eq!(state.table.len() + outbound.len(), records.len());
        assert_eq!(state.record_count, records.len());
    }

    #[test]
    fn worked_example_matches_placement_module() {
        let mut state = RingState::new(PeerHandle::new("a", "127.0.0.1", 15002));
        state.install_set_id(
            2,
            3,
            vec![
                PeerHandle::new("a", "127.0.0.1", 15002),
                PeerHandle::new("b", "127.0.0.1", 15004),
                PeerHandle::new("c", "127.0.0.1", 15006),
            ],
        );

        let records = vec![record(10_120_412), record(1), record(1), record(1), record(1)];
        let dataset = InMemoryDatasetSource::new(records);

        let outbound = build(&mut state, &dataset, 1950).unwrap();
        assert_eq!(state.table.len(), 1);
        assert_eq!(outbound.len(), 4);
    }
}
