mod cli;
mod dht;
mod dispatcher;
mod error;
mod io;
mod lifecycle;
mod query;
mod ring;
mod shell;

use std::sync::Arc;

use clap::Parser;
use ring_proto::PeerHandle;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use io::Shared;
use ring::RingState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    let socket = match UdpSocket::bind(cli.bind).await {
        Ok(socket) => socket,
        Err(error) => {
            tracing::error!(%error, addr = %cli.bind, "failed to bind peer socket");
            return Err(error.into());
        }
    };
    tracing::info!(addr = %cli.bind, manager = %cli.manager, "peer ready");

    let identity = PeerHandle::new("unregistered", cli.bind.ip().to_string(), cli.bind.port());
    let shared = Shared {
        socket: Arc::new(socket),
        manager_addr: cli.manager,
        csv_dir: cli.csv_dir,
        state: Arc::new(Mutex::new(RingState::new(identity))),
    };

    let dispatcher_shared = shared.clone();
    let dispatcher = tokio::spawn(async move { dispatcher::run(dispatcher_shared).await });

    tokio::select! {
        _ = shell::run(shared) => {}
        _ = dispatcher => {}
        _ = shutdown_signal() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .init();
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
