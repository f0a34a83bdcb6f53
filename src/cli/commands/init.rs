//! Implementation of the `geodispatch init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, DEFAULT_CONFIG_FILE};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_file: PathBuf,
    pub config_written: bool,
    pub plugins_dir: PathBuf,
    pub database: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("\nWrote configuration to {}", self.config_file.display()));
        }
        lines.push(format!("Plugin map configuration goes in {}", self.plugins_dir.display()));
        lines.push(format!("Database initialized at {}", self.database));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config_path: Option<&Path>, json_mode: bool) -> Result<()> {
    let config_file = config_path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

    let (config, config_written) = if config_file.exists() && !args.force {
        (ConfigLoader::load(Some(&config_file))?, false)
    } else {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize default configuration")?;
        if let Some(parent) = config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&config_file, yaml)
            .await
            .with_context(|| format!("Failed to write {}", config_file.display()))?;
        (config, true)
    };

    let plugins_dir = ConfigLoader::config_dir(Some(&config_file)).join(&config.plugins_dir);
    tokio::fs::create_dir_all(&plugins_dir)
        .await
        .with_context(|| format!("Failed to create {}", plugins_dir.display()))?;

    initialize_database(&config.database)
        .await
        .with_context(|| format!("Failed to initialize database {}", config.database.path))?;

    let message = if config_written {
        "Geodispatch initialized.".to_string()
    } else {
        "Configuration already present; database is up to date. Use --force to rewrite the configuration.".to_string()
    };

    output(
        &InitOutput {
            success: true,
            message,
            config_file,
            config_written,
            plugins_dir,
            database: config.database.path,
        },
        json_mode,
    );
    Ok(())
}
