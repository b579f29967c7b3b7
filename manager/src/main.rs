mod cli;
mod error;
mod ports;
mod registry;
mod session;

use clap::Parser;
use ring_proto::{ManagerReply, ManagerRequest};
use ring_rand::Source;
use tokio::net::UdpSocket;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    let socket = match UdpSocket::bind(cli.bind).await {
        Ok(socket) => socket,
        Err(error) => {
            tracing::error!(%error, addr = %cli.bind, "failed to bind manager socket");
            return Err(error.into());
        }
    };
    tracing::info!(addr = %cli.bind, min_port = cli.min_port, max_port = cli.max_port, "manager listening");

    let mut session = Session::new(cli.min_port, cli.max_port, Source::from_entropy());
    let mut buf = vec![0u8; ring_proto::MAX_DATAGRAM_BYTES];

    loop {
        let (len, from) = tokio::select! {
            result = socket.recv_from(&mut buf) => match result {
                Ok(pair) => pair,
                Err(error) => {
                    tracing::warn!(%error, "failed to receive datagram");
                    continue;
                }
            },
            _ = shutdown_signal() => {
                tracing::info!("shutting down");
                break;
            }
        };

        let reply = match ring_proto::decode::<ManagerRequest>(&buf[..len]) {
            Ok(request) => {
                tracing::debug!(peer = request.peer_name(), "handling request");
                match session.handle(request) {
                    Ok(success) => ManagerReply::Success(success),
                    Err(err) => {
                        tracing::warn!(%err, "request failed");
                        ManagerReply::failure(err.as_message())
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to decode datagram");
                ManagerReply::failure(err.to_string())
            }
        };

        match ring_proto::encode(&reply) {
            Ok(bytes) => {
                if let Err(error) = socket.send_to(&bytes, from).await {
                    tracing::warn!(%error, %from, "failed to send reply");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to encode reply"),
        }
    }

    Ok(())
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

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .init();
}
