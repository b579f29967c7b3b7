use crate::primes::next_prime_greater_than;

/// Where a record belongs: `node` is the ring identifier that owns it,
/// `slot` is its index within that node's local table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub node: usize,
    pub slot: u64,
}

/// The local hash table size `s`: the least prime strictly greater than
/// `2 * record_count`. Computed once from the total dataset size, not
/// per-node, and reused for both placement and `find-event` lookups.
pub fn table_size(record_count: usize) -> u64 {
    next_prime_greater_than(2 * record_count as u64)
}

/// Map an event id to its ring node and local slot, given the dataset-wide
/// table size `s` and the current ring size `n`.
///
/// `pos = event_id mod s`; `id = pos mod n`.
pub fn place(event_id: i64, table_size: u64, ring_size: usize) -> Placement {
    assert!(ring_size > 0, "ring_size must be positive");
    assert!(table_size > 0, "table_size must be positive");

    let pos = event_id.rem_euclid(table_size as i64) as u64;
    let node = (pos % ring_size as u64) as usize;

    Placement { node, slot: pos }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_from_spec() {
        // ℓ = 5, ring_size = 3: s = next_prime_greater_than(10) = 11.
        // event_id = 10120412: pos = 10120412 mod 11 = 8; id = 8 mod 3 = 2.
        let s = table_size(5);
        assert_eq!(s, 11);

        let placement = place(10_120_412, s, 3);
        assert_eq!(placement.slot, 8);
        assert_eq!(placement.node, 2);
    }

    #[test]
    fn node_is_always_in_range() {
        let s = table_size(200);
        for ring_size in 1..=10usize {
            for event_id in 0..1000i64 {
                let placement = place(event_id, s, ring_size);
                assert!(placement.node < ring_size);
            }
        }
    }
}
