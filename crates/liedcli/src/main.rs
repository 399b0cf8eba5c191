//! liedcli - analysis and concatenation tools for .nwctxt song files
//!
//! Subcommands:
//! - `liedcli analyze <input>` - structural analysis report
//! - `liedcli concat <songtitle>` - merge a song's section files in sequence order
//! - `liedcli stems <input>` - per-staff solo copies for audio rendering

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use nwctxt::timing::TimeSig;
use std::path::PathBuf;

mod commands;
mod sequence;

#[derive(Parser)]
#[command(name = "liedcli")]
#[command(about = "Analysis and concatenation tools for .nwctxt song files")]
#[command(version)]
struct Cli {
    /// Config file (takes the place of ./liedwerk.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a song: measures, pickup, lead-in, lyrics per measure
    Analyze {
        /// Song title or path; a bare title is looked up in the build dir
        input: String,

        /// Tempo override in bpm
        #[arg(long)]
        tempo: Option<u32>,

        /// Time signature override, e.g. 4/4
        #[arg(long)]
        timesig: Option<String>,
    },

    /// Concatenate a song's section files in sequence order
    Concat {
        /// Song title; sections live in <songs_dir>/<title>/nwc/
        songtitle: String,

        /// Keep tempo indicators from all sections (default: first only)
        #[arg(long)]
        keep_tempi: bool,
    },

    /// Write one solo copy of the document per named staff
    Stems {
        /// Song title or path; a bare title is looked up in the build dir
        input: String,

        /// Only these staff names (default: all named staves)
        #[arg(long)]
        staves: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = liedconf::LiedConfig::load_from(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.telemetry.log_level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            tempo,
            timesig,
        } => {
            let timesig = timesig
                .map(|s| {
                    s.parse::<TimeSig>()
                        .map_err(|_| anyhow!("invalid time signature '{s}', expected e.g. 4/4"))
                })
                .transpose()?;
            commands::analyze::run(&config, &input, tempo, timesig)?;
        }
        Commands::Concat {
            songtitle,
            keep_tempi,
        } => {
            commands::concat::run(&config, &songtitle, keep_tempi)?;
        }
        Commands::Stems { input, staves } => {
            commands::stems::run(&config, &input, &staves)?;
        }
    }

    Ok(())
}
