use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "peer", about = "Storm-ring peer")]
pub struct Cli {
    /// The manager's address.
    #[arg(long, default_value = "127.0.0.1:15000")]
    pub manager: SocketAddr,

    /// Address this peer binds its one socket to.
    #[arg(long, default_value = "127.0.0.1:15002")]
    pub bind: SocketAddr,

    /// Directory containing the `details-YYYY.csv` dataset files.
    #[arg(long, default_value = "./fixtures")]
    pub csv_dir: PathBuf,

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
