//! The single receive loop (§4.3): decode one datagram, switch on
//! `Envelope`'s outer `status`, and route manager replies / ring traffic to
//! the right handler.

use ring_proto::{Envelope, ManagerSuccess, PeerMessage};
use ring_rand::Source;
use tokio::sync::Mutex;

use crate::io::Shared;
use crate::{lifecycle, query};

pub async fn run(shared: Shared) {
    let mut buf = vec![0u8; ring_proto::MAX_DATAGRAM_BYTES];
    let rng = Mutex::new(Source::from_entropy());

    loop {
        let (len, from) = match shared.socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(%error, "failed to receive datagram");
                continue;
            }
        };

        let raw = &buf[..len];
        let envelope = match ring_proto::decode::<Envelope>(raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                tracing::warn!(%error, %from, "failed to decode datagram");
                continue;
            }
        };

        if let Err(error) = handle(&shared, &rng, envelope, raw).await {
            tracing::warn!(%error, "failed to handle message");
        }
    }
}

async fn handle(
    shared: &Shared,
    rng: &Mutex<Source>,
    envelope: Envelope,
    raw: &[u8],
) -> Result<(), crate::error::PeerError> {
    match envelope {
        Envelope::Failure { message } => {
            tracing::warn!(message, "manager reported failure");
            Ok(())
        }
        Envelope::Success(success) => handle_manager_success(shared, success).await,
        Envelope::PeerMessage(message) => handle_peer_message(shared, rng, message, raw).await,
    }
}

async fn handle_manager_success(shared: &Shared, success: ManagerSuccess) -> Result<(), crate::error::PeerError> {
    match success {
        ManagerSuccess::SetupDht { members, size } => {
            let year = shared
                .state
                .lock()
                .await
                .pending_setup_year
                .take()
                .unwrap_or(1950);
            lifecycle::start_setup(shared, members, size, year).await
        }
        ManagerSuccess::LeaveDht => lifecycle::begin_leave_sweep(shared).await,
        ManagerSuccess::JoinDht { peer_name, addr, p_port } => {
            let prior_leader = ring_proto::PeerHandle::new(peer_name, addr, p_port);
            lifecycle::begin_join(shared, prior_leader).await
        }
        ManagerSuccess::TeardownDht => lifecycle::start_teardown(shared).await,
        ManagerSuccess::QueryDht { peer_name, addr, p_port } => {
            let event_id = shared.state.lock().await.pending_find_event.take();
            match event_id {
                Some(event_id) => {
                    let target = ring_proto::PeerHandle::new(peer_name, addr, p_port);
                    query::start_find_event(shared, &target, event_id).await
                }
                None => {
                    tracing::warn!(peer_name, addr, p_port, "query-dht reply with no pending event id");
                    Ok(())
                }
            }
        }
        ManagerSuccess::Register
        | ManagerSuccess::Deregister
        | ManagerSuccess::DhtComplete
        | ManagerSuccess::TeardownComplete
        | ManagerSuccess::DhtRebuilt => Ok(()),
    }
}

async fn handle_peer_message(
    shared: &Shared,
    rng: &Mutex<Source>,
    message: PeerMessage,
    raw: &[u8],
) -> Result<(), crate::error::PeerError> {
    match message {
        PeerMessage::SetId { identifier, ring_size, members } => {
            lifecycle::handle_set_id(shared, identifier, ring_size, members).await;
            Ok(())
        }
        PeerMessage::Store { id, entry, year } => lifecycle::handle_store(shared, id, entry, year, raw).await,
        PeerMessage::Teardown { cause } => lifecycle::handle_teardown(shared, cause, raw).await,
        PeerMessage::ResetId { identifier, cause, initiator } => {
            lifecycle::handle_reset_id(shared, identifier, cause, initiator).await
        }
        PeerMessage::RebuildDht { origin, hops_remaining, new_leader, members } => {
            lifecycle::handle_rebuild_dht(shared, origin, hops_remaining, new_leader, members).await
        }
        PeerMessage::FindEvent { event_id, id_seq } => handle_find_event(shared, rng, event_id, id_seq).await,
    }
}

async fn handle_find_event(
    shared: &Shared,
    rng: &Mutex<Source>,
    event_id: i64,
    id_seq: Vec<usize>,
) -> Result<(), crate::error::PeerError> {
    let outcome = {
        let state = shared.state.lock().await;
        let mut rng = rng.lock().await;
        query::resolve(&state, event_id, &id_seq, &mut rng)
    };

    match outcome {
        query::Lookup::Hit(record) => {
            tracing::info!(event_id, visited = ?id_seq, ?record, "find-event hit");
            Ok(())
        }
        query::Lookup::NotFound => {
            tracing::info!(event_id, visited = ?id_seq, "find-event exhausted the ring without a match");
            Ok(())
        }
        query::Lookup::Forward(message, handle) => shared.send_to_peer(&handle, message).await,
    }
}
