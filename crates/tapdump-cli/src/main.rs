//! tapdump - Mifare Classic acquisition tool
//!
//! Listens for contactless cards, reports each tap and optionally dumps the
//! sectors the default keys unlock.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tapdump_acquisition::AcquisitionMode;
use tapdump_core::MifareKey;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod config;
mod output;

use commands::hex::HexCommands;
use commands::listen::ListenOptions;
use commands::simulate::{CardSize, SimulatedCard, Slot};
use config::{FileConfig, Overrides};
use output::OutputFormat;

/// tapdump - Mifare Classic acquisition tool
#[derive(Parser, Debug)]
#[command(name = "tapdump")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error); falls back to RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by the acquiring commands.
#[derive(clap::Args, Debug)]
struct AcquireArgs {
    /// Dump every Classic card instead of only reporting its identity
    #[arg(long)]
    dump: bool,

    /// Extra candidate key (12 hex digits), tried after the defaults
    #[arg(short, long = "key", value_name = "HEX")]
    keys: Vec<MifareKey>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl AcquireArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            mode: self.dump.then_some(AcquisitionMode::FullDump),
            extra_keys: self.keys.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Acquire cards from a PC/SC reader until interrupted
    Listen {
        /// Substring of the reader name to use
        #[arg(short, long)]
        reader: Option<String>,

        #[command(flatten)]
        acquire: AcquireArgs,
    },

    /// Tap a simulated card and print what the pipeline reports
    Simulate {
        /// Card UID in hex
        #[arg(long, default_value = "04:A2:5F:11")]
        uid: String,

        /// Card capacity
        #[arg(long, value_enum, default_value_t = CardSize::OneK)]
        size: CardSize,

        /// Key every sector accepts (default: factory key in both slots)
        #[arg(long, value_name = "HEX")]
        card_key: Option<MifareKey>,

        /// Slot the card key is accepted in
        #[arg(long, value_enum, default_value_t = Slot::A)]
        slot: Slot,

        /// Sector that refuses every key
        #[arg(long, value_name = "SECTOR")]
        locked: Vec<u16>,

        /// Block whose read faults
        #[arg(long, value_name = "BLOCK")]
        faulty_block: Vec<u16>,

        #[command(flatten)]
        acquire: AcquireArgs,
    },

    /// Hex codec helpers
    #[command(subcommand)]
    Hex(HexCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = FileConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Listen { reader, acquire } => {
            let options = ListenOptions {
                reader,
                overrides: acquire.overrides(),
                format: acquire.format,
            };
            commands::listen::run(&config, options).await
        }
        Commands::Simulate {
            uid,
            size,
            card_key,
            slot,
            locked,
            faulty_block,
            acquire,
        } => {
            let card = SimulatedCard {
                uid,
                size,
                card_key,
                slot,
                locked,
                faulty_blocks: faulty_block,
            };
            commands::simulate::run(&config, &card, acquire.overrides(), acquire.format).await
        }
        Commands::Hex(command) => commands::hex::run(command),
    }
}
