//! Encore CLI - desktop companion for controller recordings
//!
//! Reads the `.vrf` logs a robot writes to its storage card:
//! - `info` and `dump` decode a log file directly
//! - `position` reads the starting pose stored in a log's header
//! - `replay` runs a log through the playback engine in real time

mod config;
mod inspect;
mod replay;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::CliConfig;
use inspect::LogReport;

/// Inspect and replay controller recordings
#[derive(Parser, Debug)]
#[command(name = "encore")]
#[command(about = "Inspect and replay controller recordings")]
#[command(version)]
struct Args {
    /// Directory (or file) holding encore.toml
    #[arg(short, long, global = true, default_value = ".")]
    config: PathBuf,

    /// Override the directory logs are read from
    #[arg(short, long, global = true)]
    mount: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default encore.toml
    Init {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Summarize a log file
    Info { file: PathBuf },

    /// Print the frames of a log file
    Dump {
        file: PathBuf,

        /// Stop after this many frames
        #[arg(short, long)]
        limit: Option<usize>,

        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Print the starting position stored in a named recording
    Position { name: String },

    /// Play a named recording back in real time
    Replay { name: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Command::Init { dir } = &args.command {
        CliConfig::write_default(dir)?;
        println!("Wrote {}", dir.join(config::CONFIG_FILE).display());
        return Ok(());
    }

    let mut config = CliConfig::load_from_dir(&args.config)?;
    if let Some(mount) = args.mount {
        config.engine = config.engine.with_mount_point(mount);
    }

    match args.command {
        Command::Init { .. } => {}
        Command::Info { file } => {
            let report = LogReport::read(&file)?;
            print!(
                "{}",
                inspect::format_info(&file, &report, config.engine.period())
            );
        }
        Command::Dump { file, limit, json } => {
            let report = LogReport::read(&file)?;
            print!("{}", inspect::format_dump(&report, limit, json)?);
        }
        Command::Position { name } => {
            let origin = replay::position(&config, &name)?;
            println!(
                "x={} y={} heading={}",
                origin.x, origin.y, origin.heading
            );
        }
        Command::Replay { name } => {
            tracing::info!(
                "Replaying '{}' from {}",
                name,
                config.engine.mount_point.display()
            );
            let summary = replay::replay(&config, &name)?;
            println!(
                "{} frames played ({:?}), recorded for {}s",
                summary.frames, summary.reason, summary.header.duration_seconds
            );
        }
    }

    Ok(())
}
