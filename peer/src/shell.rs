//! Line-oriented operator shell (§4.7). Only formats and sends requests or
//! kicks off a `find-event`; all protocol logic lives in `lifecycle`/`query`
//! so both stay reachable without going through stdin.

use ring_proto::ManagerRequest;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::PeerError;
use crate::io::Shared;

const MAX_NAME_LEN: usize = 15;

fn validate_peer_name(name: &str) -> Result<(), PeerError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PeerError::InvalidPeerName(name.to_string()));
    }
    Ok(())
}

pub async fn run(shared: Shared) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(%error, "failed to read shell input");
                break;
            }
        };

        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((command, args)) = words.split_first() else {
            continue;
        };

        if *command == "exit" {
            tracing::info!("exiting");
            break;
        }

        if let Err(error) = dispatch(&shared, command, args).await {
            println!("error: {error}");
        }
    }
}

async fn dispatch(shared: &Shared, command: &str, args: &[&str]) -> Result<(), PeerError> {
    match command {
        "register" => register(shared, args).await,
        "setup-dht" => setup_dht(shared, args).await,
        "teardown-dht" => {
            let peer_name = shared.state.lock().await.identity.name.clone();
            shared
                .send_to_manager(&ManagerRequest::TeardownDht { peer_name })
                .await
        }
        "query-dht" => query_dht(shared, args).await,
        "leave-dht" => leave_dht(shared).await,
        "join-dht" => join_dht(shared, args).await,
        other => {
            println!("unrecognized command: {other}");
            Ok(())
        }
    }
}

async fn register(shared: &Shared, args: &[&str]) -> Result<(), PeerError> {
    let [name, ip, m_port, p_port] = args else {
        println!("usage: register <name> <ip> <m_port> <p_port>");
        return Ok(());
    };
    validate_peer_name(name)?;
    let p_port: u16 = p_port.parse().unwrap_or_default();

    {
        let mut state = shared.state.lock().await;
        state.identity = ring_proto::PeerHandle::new(*name, *ip, p_port);
    }

    shared
        .send_to_manager(&ManagerRequest::Register {
            peer_name: name.to_string(),
            ipv4_address: ip.to_string(),
            m_port: m_port.parse().unwrap_or_default(),
            p_port,
        })
        .await
}

async fn setup_dht(shared: &Shared, args: &[&str]) -> Result<(), PeerError> {
    let [n, year] = args else {
        println!("usage: setup-dht <n> <year>");
        return Ok(());
    };
    let year: u16 = year.parse().unwrap_or_default();
    let peer_name = {
        let mut state = shared.state.lock().await;
        state.pending_setup_year = Some(year);
        state.identity.name.clone()
    };
    shared
        .send_to_manager(&ManagerRequest::SetupDht {
            peer_name,
            n: n.parse().unwrap_or_default(),
            year,
        })
        .await
}

/// Sends `query-dht`, stashing the target event id; the dispatcher starts
/// the actual `find-event` walk once the manager names a ring member to
/// contact (see `dispatcher::handle_manager_success`).
async fn query_dht(shared: &Shared, args: &[&str]) -> Result<(), PeerError> {
    let [_target_peer, event_id] = args else {
        println!("usage: query-dht <peer-name> <event-id>");
        return Ok(());
    };
    let event_id: i64 = match event_id.parse() {
        Ok(id) => id,
        Err(_) => {
            println!("event-id must be an integer");
            return Ok(());
        }
    };

    let peer_name = {
        let mut state = shared.state.lock().await;
        state.pending_find_event = Some(event_id);
        state.identity.name.clone()
    };
    shared
        .send_to_manager(&ManagerRequest::QueryDht { peer_name })
        .await
}

async fn leave_dht(shared: &Shared) -> Result<(), PeerError> {
    let peer_name = shared.state.lock().await.identity.name.clone();
    crate::lifecycle::mark_leaving(shared).await;
    shared
        .send_to_manager(&ManagerRequest::LeaveDht { peer_name })
        .await
}

async fn join_dht(shared: &Shared, args: &[&str]) -> Result<(), PeerError> {
    let [name, ip, m_port, p_port] = args else {
        println!("usage: join-dht <name> <ip> <m_port> <p_port>");
        return Ok(());
    };
    validate_peer_name(name)?;
    let p_port: u16 = p_port.parse().unwrap_or_default();

    {
        let mut state = shared.state.lock().await;
        state.identity = ring_proto::PeerHandle::new(*name, *ip, p_port);
    }

    shared
        .send_to_manager(&ManagerRequest::Register {
            peer_name: name.to_string(),
            ipv4_address: ip.to_string(),
            m_port: m_port.parse().unwrap_or_default(),
            p_port,
        })
        .await?;
    shared
        .send_to_manager(&ManagerRequest::JoinDht {
            peer_name: name.to_string(),
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_overlong_names() {
        assert!(validate_peer_name("").is_err());
        assert!(validate_peer_name(&"a".repeat(16)).is_err());
    }

    #[test]
    fn rejects_non_alphabetic_names() {
        assert!(validate_peer_name("peer1").is_err());
        assert!(validate_peer_name("peer-a").is_err());
    }

    #[test]
    fn accepts_short_alphabetic_names() {
        assert!(validate_peer_name("apple").is_ok());
        assert!(validate_peer_name("a").is_ok());
    }
}
