//! Setup, teardown, leave and join choreography (§4.5). Each ring sweep
//! (`teardown`, `reset-id`, `rebuild-dht`) terminates by returning to its
//! initiator, identified by one of `RingState`'s transient flags rather than
//! by address, since the initiator's own address may have just left the
//! ring.

use ring_hash::FileDatasetSource;
use ring_proto::{Cause, ManagerRequest, PeerHandle, PeerMessage};

use crate::error::PeerError;
use crate::io::Shared;

/// Leader-side setup, run once `setup-dht` comes back SUCCESS (§4.5 setup,
/// steps 1 and 3).
pub async fn start_setup(
    shared: &Shared,
    members: Vec<PeerHandle>,
    size: usize,
    year: u16,
) -> Result<(), PeerError> {
    {
        let mut state = shared.state.lock().await;
        state.install_set_id(0, size, members.clone());
    }

    for (identifier, member) in members.iter().enumerate().skip(1) {
        shared
            .send_to_peer(
                member,
                PeerMessage::SetId {
                    identifier,
                    ring_size: size,
                    members: members.clone(),
                },
            )
            .await?;
    }

    run_local_build(shared, year).await?;

    let peer_name = shared.state.lock().await.identity.name.clone();
    shared
        .send_to_manager(&ManagerRequest::DhtComplete { peer_name })
        .await?;
    Ok(())
}

/// Non-leader side of setup: install the assignment handed down by the
/// leader (§4.5 setup, step 2).
pub async fn handle_set_id(
    shared: &Shared,
    identifier: usize,
    ring_size: usize,
    members: Vec<PeerHandle>,
) {
    let mut state = shared.state.lock().await;
    state.install_set_id(identifier, ring_size, members);
}

async fn run_local_build(shared: &Shared, year: u16) -> Result<(), PeerError> {
    let dataset = FileDatasetSource::new(shared.csv_dir.clone());
    let stores = {
        let mut state = shared.state.lock().await;
        crate::dht::build(&mut state, &dataset, year)?
    };
    forward(shared, stores).await
}

/// Learns this year's `table_size`/`record_count` without clearing or
/// rebuilding `state.table`. Called the first time a non-leader node owns a
/// `store` for a year it hasn't seen, so its placement-side `s` matches the
/// leader's (§9); unlike [`run_local_build`] this does no placement of its
/// own and never touches already-accumulated entries.
async fn size_local_table(shared: &Shared, year: u16) -> Result<(), PeerError> {
    let dataset = FileDatasetSource::new(shared.csv_dir.clone());
    let (table_size, record_count) = crate::dht::size_for_year(&dataset, year)?;
    let mut state = shared.state.lock().await;
    state.table_size = table_size;
    state.record_count = record_count;
    state.year_used = Some(year);
    Ok(())
}

async fn forward(shared: &Shared, messages: Vec<PeerMessage>) -> Result<(), PeerError> {
    let right = shared.state.lock().await.right_neighbor().cloned();
    let Some(right) = right else { return Ok(()) };
    for message in messages {
        shared.send_to_peer(&right, message).await?;
    }
    Ok(())
}

/// A `store` arriving over the wire: keep it if we own it, otherwise forward
/// the original datagram unchanged (§4.4, ring-forwarding discipline — the
/// re-sent bytes, not a decode/re-encode round trip). The owning node also
/// learns `table_size`/`record_count` for `year` the first time it sees it,
/// since only the DHT leader runs [`run_local_build`] and every other node
/// would otherwise query against a `table_size` stuck at its zero default.
pub async fn handle_store(
    shared: &Shared,
    id: usize,
    entry: ring_hash::Record,
    year: u16,
    raw: &[u8],
) -> Result<(), PeerError> {
    let (owned, right, needs_sizing) = {
        let state = shared.state.lock().await;
        let owned = id == state.identifier;
        let needs_sizing = owned && state.year_used != Some(year);
        (owned, state.right_neighbor().cloned(), needs_sizing)
    };

    if owned {
        if needs_sizing {
            size_local_table(shared, year).await?;
        }
        shared.state.lock().await.table.push(entry);
    } else if let Some(right) = right {
        shared.forward_raw(&right, raw).await?;
    }
    Ok(())
}

/// Leader-initiated teardown: clear the local table and start the sweep
/// (§4.5 teardown, step 1).
pub async fn start_teardown(shared: &Shared) -> Result<(), PeerError> {
    let right = {
        let mut state = shared.state.lock().await;
        state.tearing_down = true;
        state.clear_table();
        state.right_neighbor().cloned()
    };
    if let Some(right) = right {
        shared
            .send_to_peer(&right, PeerMessage::Teardown { cause: None })
            .await?;
    }
    Ok(())
}

/// The peer-initiated half of a leave: mark `leaving` so the sweep this peer
/// eventually sees again is recognized as its own.
pub async fn mark_leaving(shared: &Shared) {
    shared.state.lock().await.leaving = true;
}

/// Once the manager has confirmed `leave-dht`, start the teardown sweep that
/// precedes reset-id (§4.5 leave, step 1).
pub async fn begin_leave_sweep(shared: &Shared) -> Result<(), PeerError> {
    let right = {
        let mut state = shared.state.lock().await;
        state.clear_table();
        state.right_neighbor().cloned()
    };
    if let Some(right) = right {
        shared
            .send_to_peer(&right, PeerMessage::Teardown { cause: Some(Cause::Leave) })
            .await?;
    }
    Ok(())
}

/// Mirror of [`mark_leaving`] for the joiner (§4.5 join, step 1).
pub async fn begin_join(shared: &Shared, prior_leader: PeerHandle) -> Result<(), PeerError> {
    let identity = {
        let mut state = shared.state.lock().await;
        state.identifier = 0;
        state.ring_size = 2;
        state.members = vec![state.identity.clone(), prior_leader.clone()];
        state.joining = true;
        state.identity.clone()
    };
    shared
        .send_to_peer(
            &prior_leader,
            PeerMessage::ResetId {
                identifier: 1,
                cause: Cause::Join,
                initiator: Some(identity),
            },
        )
        .await
}

fn is_initiator(state: &crate::ring::RingState, cause: Option<Cause>) -> bool {
    match cause {
        None => state.tearing_down,
        Some(Cause::Leave) => state.leaving,
        Some(Cause::Join) => state.joining,
    }
}

/// Every `teardown` goes through here, whatever kicked it off (§4.5 teardown
/// step 2, also shared by leave/join). A non-initiator forwards the original
/// datagram unchanged, same raw re-send discipline as `store` (§4.4) — the
/// `cause` carried in the message never changes hop to hop.
pub async fn handle_teardown(shared: &Shared, cause: Option<Cause>, raw: &[u8]) -> Result<(), PeerError> {
    let (initiator, right, peer_name) = {
        let mut state = shared.state.lock().await;
        state.clear_table();
        (
            is_initiator(&state, cause),
            state.right_neighbor().cloned(),
            state.identity.name.clone(),
        )
    };

    if initiator {
        match cause {
            None => {
                shared
                    .send_to_manager(&ManagerRequest::TeardownComplete { peer_name })
                    .await?;
            }
            Some(Cause::Leave) => start_leave_reset_id(shared).await?,
            Some(Cause::Join) => {
                let new_leader = shared.state.lock().await.identity.name.clone();
                start_rebuild(shared, new_leader).await?;
            }
        }
    } else if let Some(right) = right {
        shared.forward_raw(&right, raw).await?;
    }
    Ok(())
}

async fn start_leave_reset_id(shared: &Shared) -> Result<(), PeerError> {
    let right = shared.state.lock().await.right_neighbor().cloned();
    if let Some(right) = right {
        shared
            .send_to_peer(
                &right,
                PeerMessage::ResetId {
                    identifier: 0,
                    cause: Cause::Leave,
                    initiator: None,
                },
            )
            .await?;
    }
    Ok(())
}

/// A `reset-id` hop, for both leave (rotate down) and join (rotate up). The
/// carried `identifier` increments every hop, so this (like `rebuild-dht` and
/// `find-event`) is relayed by reconstructing and re-sending, never by raw
/// re-send — the message's own content is defined to mutate hop to hop.
/// (§4.5 leave step 3, join step 2).
pub async fn handle_reset_id(
    shared: &Shared,
    identifier: usize,
    cause: Cause,
    initiator: Option<PeerHandle>,
) -> Result<(), PeerError> {
    let already_mine = {
        let state = shared.state.lock().await;
        match cause {
            Cause::Leave => state.leaving,
            Cause::Join => state.joining,
        }
    };

    if already_mine {
        let new_leader = match cause {
            Cause::Leave => shared
                .state
                .lock()
                .await
                .members
                .first()
                .map(|h| h.name.clone())
                .unwrap_or_default(),
            Cause::Join => shared.state.lock().await.identity.name.clone(),
        };
        start_rebuild(shared, new_leader).await?;
        if cause == Cause::Leave {
            shared.state.lock().await.leave_ring();
        }
        return Ok(());
    }

    let right = {
        let mut state = shared.state.lock().await;
        match cause {
            Cause::Leave => {
                state.identifier = identifier;
                state.members.pop();
                state.ring_size = state.ring_size.saturating_sub(1);
            }
            Cause::Join => {
                state.ring_size += 1;
                state.identifier = identifier;
                if let Some(initiator) = &initiator {
                    if state.members.first() != Some(initiator) {
                        state.members.insert(0, initiator.clone());
                    }
                }
            }
        }
        state.right_neighbor().cloned()
    };

    if let Some(right) = right {
        shared
            .send_to_peer(
                &right,
                PeerMessage::ResetId {
                    identifier: identifier + 1,
                    cause,
                    initiator,
                },
            )
            .await?;
    }
    Ok(())
}

/// Kick off a from-scratch rebuild of the local table at every ring node
/// (§4.5 leave/join step 4). `hops_remaining = 0` is a sentinel meaning "not
/// yet counted"; the first node to actually process the message seeds it,
/// and `members`, from its own (already up to date) ring state, since the
/// origin's own membership view is stale the moment a leave/join sweep
/// starts (it is either departing or not yet installed as a full member).
async fn start_rebuild(shared: &Shared, new_leader: String) -> Result<(), PeerError> {
    let (right, origin) = {
        let state = shared.state.lock().await;
        (state.right_neighbor().cloned(), state.identity.clone())
    };
    if let Some(right) = right {
        shared
            .send_to_peer(
                &right,
                PeerMessage::RebuildDht {
                    origin,
                    hops_remaining: 0,
                    new_leader,
                    members: Vec::new(),
                },
            )
            .await?;
    }
    Ok(())
}

/// Each node's local rebuild, and the terminal node's report to the manager
/// (§4.5 leave/join step 4; §4.4 for the rebuild algorithm itself). Gated on
/// `year_used`, which a non-leader node now also picks up from its first
/// owned `store` of each year (see `handle_store`/`size_local_table`), so a
/// node that has never owned a record still skips the rebuild correctly
/// rather than running it against a stale or absent year. For a join, the
/// terminal node is the joiner itself, completing the loop back around the
/// ring; it installs the carried `members`/ring size so it leaves this sweep
/// as a proper ring member rather than with the stale two-node placeholder
/// from `begin_join`.
pub async fn handle_rebuild_dht(
    shared: &Shared,
    origin: PeerHandle,
    hops_remaining: usize,
    new_leader: String,
    members: Vec<PeerHandle>,
) -> Result<(), PeerError> {
    let year = shared.state.lock().await.year_used;
    if let Some(year) = year {
        run_local_build(shared, year).await?;
    }

    let (remaining, right, peer_name, members) = {
        let mut state = shared.state.lock().await;
        let (seeded, members) = if hops_remaining == 0 {
            (state.ring_size, state.members.clone())
        } else {
            (hops_remaining, members)
        };
        if state.joining {
            state.ring_size = members.len();
            state.members = members.clone();
        }
        (
            seeded.saturating_sub(1),
            state.right_neighbor().cloned(),
            state.identity.name.clone(),
            members,
        )
    };

    if remaining == 0 {
        shared
            .send_to_manager(&ManagerRequest::DhtRebuilt {
                peer_name,
                new_leader,
            })
            .await?;
    } else if let Some(right) = right {
        shared
            .send_to_peer(
                &right,
                PeerMessage::RebuildDht {
                    origin,
                    hops_remaining: remaining,
                    new_leader,
                    members,
                },
            )
            .await?;
    }
    Ok(())
}
