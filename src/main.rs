//! Geodispatch CLI entry point.

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use geodispatch::cli::{commands, handle_error, App, Cli, Commands};
use geodispatch::infrastructure::config::ConfigLoader;
use geodispatch::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, config_path, cli.json).await,
        command => dispatch(command, config_path, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}

/// Commands that run against a loaded configuration and an open database.
async fn dispatch(command: Commands, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = ConfigLoader::load(config_path)?;
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;
    let app = App::open(config, config_path).await?;

    match command {
        Commands::Init(_) => Ok(()),
        Commands::Run(args) => commands::run::execute(args, app, json).await,
        Commands::Cycle(args) => commands::cycle::execute(args, app, json).await,
        Commands::Tasks(cmd) => commands::tasks::execute(cmd, app, json).await,
        Commands::Areas(cmd) => commands::areas::execute(cmd, app, json).await,
    }
}
