//! CLI Command Definitions
//!
//! Arguments for every pairs-screener command. Handlers live in the binary.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pairs Screener - DexScreener new-pairs harvester
#[derive(Parser, Debug)]
#[command(
    name = "pairs-screener",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "DexScreener new-pairs harvester",
    long_about = "Pairs Screener reads the DexScreener new-pairs websocket, resolves every \
                  new token address to its symbol and keeps one JSON record per day."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the pairs feed until interrupted
    Run(RunCmd),

    /// Run a single refresh cycle
    Refresh(RefreshCmd),

    /// Decode a captured pairs frame from disk
    Decode(DecodeCmd),

    /// Print a stored daily token record
    Show(ShowCmd),
}

/// Start the poll loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/screener.toml")]
    pub config: PathBuf,

    /// Override the pairs websocket URL
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,

    /// Seconds between refresh calls (defaults to the refresh interval)
    #[arg(long, value_name = "SECS")]
    pub poll_secs: Option<u64>,
}

/// Single refresh cycle
#[derive(Parser, Debug)]
pub struct RefreshCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/screener.toml")]
    pub config: PathBuf,

    /// Override the pairs websocket URL
    #[arg(long, value_name = "URL")]
    pub ws_url: Option<String>,
}

/// Decode a raw frame file
#[derive(Parser, Debug)]
pub struct DecodeCmd {
    /// Raw frame as received from the websocket
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Decode even when the frame is not a pairs frame
    #[arg(short, long)]
    pub force: bool,
}

/// Show a daily record
#[derive(Parser, Debug)]
pub struct ShowCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/screener.toml")]
    pub config: PathBuf,

    /// Day to show (YYYY-MM-DD, defaults to today)
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}
