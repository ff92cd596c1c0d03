//! horario CLI - Hours Aggregation & Payroll Export
//!
//! Command-line interface for aggregating worked hours and writing payroll
//! workbooks from a directory of JSON feed files.

mod commands;
mod config;
mod manual;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use horario_core::DetailLevel;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::Selection;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "horario")]
#[command(author, version, about = "Hours aggregation and payroll spreadsheet export", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./horario.toml when present)
    #[arg(long, global = true, env = "HORARIO_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the payroll workbook for a date range
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Detail level (totals, daily, shifts)
        #[arg(long)]
        detail: Option<DetailLevel>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Print row totals, day totals and the payroll summary
    Totals {
        #[command(flatten)]
        selection: Selection,
    },

    /// Print the save-back records for manual edits as JSON
    SavePlan {
        #[command(flatten)]
        selection: Selection,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // stdout carries command output; logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Export { selection, detail, out } => {
            let path = commands::export(&selection, detail, &out, &config).await?;
            println!("{}", path.display());
        }
        Commands::Totals { selection } => {
            print!("{}", commands::totals(&selection, &config).await?);
        }
        Commands::SavePlan { selection } => {
            println!("{}", commands::save_plan(&selection, &config).await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
