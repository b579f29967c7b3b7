use std::net::SocketAddr;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "manager", about = "Storm-ring session manager")]
pub struct Cli {
    /// Address the manager listens on.
    #[arg(long, default_value = "127.0.0.1:15000")]
    pub bind: SocketAddr,

    /// Lowest port the manager is allowed to hand out to peers.
    #[arg(long, default_value_t = 15000)]
    pub min_port: u16,

    /// Highest port the manager is allowed to hand out to peers.
    #[arg(long, default_value_t = 15499)]
    pub max_port: u16,

    /// Increase log verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn default_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
