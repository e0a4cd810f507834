pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ipvault")]
#[command(about = "Encrypted files on IPFS, shared through a ledger")]
pub struct Args {
    /// Path to the ipvault config directory (defaults to ~/.ipvault)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Act as this account instead of the configured one
    #[arg(long, global = true)]
    pub account: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
