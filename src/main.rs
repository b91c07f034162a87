//! Pairs Screener - DexScreener new-pairs harvester
//!
//! Polls the DexScreener pairs websocket and records every new token's symbol
//! in a daily JSON file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pairs_screener::adapters::cli::{CliApp, Command, DecodeCmd, RefreshCmd, RunCmd, ShowCmd};
use pairs_screener::adapters::storage::JsonFileStore;
use pairs_screener::application::Screener;
use pairs_screener::config::{load_config, Config, LoggingSection};
use pairs_screener::domain::{is_pairs_frame, DayClock, FrameDecoder};
use pairs_screener::ports::TokenStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (SCREENER_WS_URL may live there)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();

    let config = match config_path(&app.command) {
        Some(path) => Some(
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        ),
        None => None,
    };

    init_logging(app.verbose, app.debug, config.as_ref().map(|c| &c.logging))?;

    match (app.command, config) {
        (Command::Run(cmd), Some(config)) => run_command(cmd, config).await,
        (Command::Refresh(cmd), Some(config)) => refresh_command(cmd, config).await,
        (Command::Show(cmd), Some(config)) => show_command(cmd, config),
        (Command::Decode(cmd), _) => decode_command(cmd),
        (_, None) => bail!("Configuration required for this command"),
    }
}

fn config_path(command: &Command) -> Option<&Path> {
    match command {
        Command::Run(cmd) => Some(cmd.config.as_path()),
        Command::Refresh(cmd) => Some(cmd.config.as_path()),
        Command::Show(cmd) => Some(cmd.config.as_path()),
        Command::Decode(_) => None,
    }
}

fn init_logging(verbose: bool, debug: bool, logging: Option<&LoggingSection>) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        logging.map(|l| l.level.as_str()).unwrap_or("warn")
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match logging.filter(|l| l.log_to_file) {
        Some(l) => {
            let path = PathBuf::from(shellexpand::tilde(&l.log_file).to_string());
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}

fn apply_ws_url(config: &mut Config, ws_url: Option<String>) -> Result<()> {
    if let Some(url) = ws_url {
        config.screener.ws_url_override = Some(url);
        config.validate().context("Invalid --ws-url")?;
    }
    Ok(())
}

async fn run_command(cmd: RunCmd, mut config: Config) -> Result<()> {
    tracing::info!("Starting pairs screener...");
    apply_ws_url(&mut config, cmd.ws_url)?;

    let poll_interval = match cmd.poll_secs {
        Some(0) => bail!("--poll-secs must be > 0"),
        Some(secs) => Duration::from_secs(secs),
        None => config.screener.refresh_interval(),
    };

    let screener = Arc::new(Screener::from_config(&config).context("Failed to create screener")?);

    // Setup Ctrl+C handler
    let handle = Arc::clone(&screener);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    screener.run(poll_interval).await;

    let status = screener.status().await;
    tracing::info!(
        "Pairs screener stopped - {} tokens recorded today, {} addresses processed",
        status.tokens_today,
        status.processed
    );
    Ok(())
}

async fn refresh_command(cmd: RefreshCmd, mut config: Config) -> Result<()> {
    apply_ws_url(&mut config, cmd.ws_url)?;

    let screener = Screener::from_config(&config).context("Failed to create screener")?;
    let report = screener.refresh_cycle().await.context("Refresh cycle failed")?;

    println!("Refresh complete");
    println!("  Pairs frame received: {}", report.frame_received);
    println!("  Addresses decoded:    {}", report.decoded);
    println!("  Resolved:             {}", report.resolved);
    println!("  Already known:        {}", report.already_processed);
    println!("  Rejected:             {}", report.rejected);
    println!("  Failed:               {}", report.exhausted);
    println!("  New tokens:           {}", report.new_tokens);
    println!("  Saved:                {}", report.persisted);

    Ok(())
}

fn decode_command(cmd: DecodeCmd) -> Result<()> {
    let raw = fs::read(&cmd.file)
        .with_context(|| format!("Failed to read frame file {}", cmd.file.display()))?;

    if !is_pairs_frame(&raw) {
        if !cmd.force {
            bail!(
                "{} is not a pairs frame (missing preamble or pairs marker); use --force to decode anyway",
                cmd.file.display()
            );
        }
        tracing::warn!("Decoding a frame that is not a pairs frame");
    }

    let addresses = FrameDecoder::new().decode(&raw);
    for address in &addresses {
        println!("{}", address);
    }
    eprintln!("{} addresses decoded", addresses.len());

    Ok(())
}

fn show_command(cmd: ShowCmd, config: Config) -> Result<()> {
    let clock = DayClock::from_offset_minutes(config.screener.utc_offset_minutes)
        .context("utc_offset_minutes out of range")?;
    let day = cmd.date.unwrap_or_else(|| clock.today());

    let store = JsonFileStore::new(config.screener.output_dir());
    let tokens = store
        .load_all(day)
        .with_context(|| format!("Failed to load {}", store.day_path(day).display()))?;

    match cmd.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&tokens)?),
        _ => {
            println!("{} - {} tokens", store.day_path(day).display(), tokens.len());
            for (address, symbol) in &tokens {
                println!("  {:<46} {}", address, symbol);
            }
        }
    }

    Ok(())
}
