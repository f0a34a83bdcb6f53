//! Command-line interface for geodispatch.

pub mod app;
pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use app::App;

#[derive(Parser, Debug)]
#[command(name = "geodispatch")]
#[command(about = "Geodispatch - processing job orchestration for monitored areas", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./geodispatch.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file and create the database
    Init(commands::init::InitArgs),

    /// Run the cycle daemon until interrupted
    Run(commands::run::RunArgs),

    /// Run a single cycle and print its report
    Cycle(commands::cycle::CycleArgs),

    /// Inspect the job ledger
    #[command(subcommand)]
    Tasks(commands::tasks::TasksCommands),

    /// Inspect monitored areas
    #[command(subcommand)]
    Areas(commands::areas::AreasCommands),
}

/// Print a command failure and exit with a non-zero status.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
