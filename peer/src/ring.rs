use ring_hash::Record;
use ring_proto::PeerHandle;

/// Everything a peer knows about its current place in the ring, plus the
/// local slice of the DHT it's responsible for.
///
/// Not a ring member until `ring_size > 0` (i.e. until a `set-id` has been
/// installed, either as the leader or by receipt from one).
#[derive(Debug)]
pub struct RingState {
    pub identity: PeerHandle,
    pub identifier: usize,
    pub ring_size: usize,
    pub members: Vec<PeerHandle>,
    pub table: Vec<Record>,
    /// `s`, the dataset-wide hash table size fixed at placement time.
    pub table_size: u64,
    /// `ℓ`, the record count the dataset had when the table was built.
    pub record_count: usize,
    pub year_used: Option<u16>,
    pub tearing_down: bool,
    pub leaving: bool,
    pub joining: bool,
    /// An event id queued by the shell's `query-dht`, consumed once the
    /// manager's reply names a ring member to contact.
    pub pending_find_event: Option<i64>,
    /// The year requested by the shell's `setup-dht`, consumed once the
    /// manager confirms the DHT and the leader builds its local table.
    pub pending_setup_year: Option<u16>,
}

impl RingState {
    pub fn new(identity: PeerHandle) -> Self {
        Self {
            identity,
            identifier: 0,
            ring_size: 0,
            members: Vec::new(),
            table: Vec::new(),
            table_size: 0,
            record_count: 0,
            year_used: None,
            tearing_down: false,
            leaving: false,
            joining: false,
            pending_find_event: None,
            pending_setup_year: None,
        }
    }

    pub fn is_ring_member(&self) -> bool {
        self.ring_size > 0
    }

    pub fn install_set_id(&mut self, identifier: usize, ring_size: usize, members: Vec<PeerHandle>) {
        self.identifier = identifier;
        self.ring_size = ring_size;
        self.members = members;
    }

    pub fn right_neighbor(&self) -> Option<&PeerHandle> {
        if self.ring_size == 0 {
            return None;
        }
        self.members.get((self.identifier + 1) % self.ring_size)
    }

    pub fn clear_table(&mut self) {
        self.table.clear();
    }

    /// Back to `Unregistered`-within-a-ring-sense: called once teardown (or
    /// a leave that removed this very peer) completes.
    pub fn leave_ring(&mut self) {
        self.identifier = 0;
        self.ring_size = 0;
        self.members.clear();
        self.table.clear();
        self.table_size = 0;
        self.record_count = 0;
        self.year_used = None;
        self.tearing_down = false;
        self.leaving = false;
        self.joining = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> PeerHandle {
        PeerHandle::new(name, "127.0.0.1", 15002)
    }

    #[test]
    fn right_neighbor_wraps_around() {
        let mut state = RingState::new(handle("a"));
        state.install_set_id(2, 3, vec![handle("a"), handle("b"), handle("c")]);
        assert_eq!(state.right_neighbor().unwrap().name, "a");
    }

    #[test]
    fn non_member_has_no_right_neighbor() {
        let state = RingState::new(handle("a"));
        assert!(state.right_neighbor().is_none());
    }

    #[test]
    fn leave_ring_clears_everything() {
        let mut state = RingState::new(handle("a"));
        state.install_set_id(1, 3, vec![handle("a"), handle("b"), handle("c")]);
        state.year_used = Some(1950);
        state.leave_ring();
        assert!(!state.is_ring_member());
        assert!(state.members.is_empty());
        assert!(state.year_used.is_none());
    }
}
