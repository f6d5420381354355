//! transcoda: parallel batch audio converter.
//!
//! ```bash
//! transcoda convert ~/music/opus -o ~/music/mp3 -b 192kbps
//! transcoda settings set --output-dir ~/music/mp3 --bitrate 320kbps
//! transcoda settings show
//! ```

mod cli;
mod commands;
mod console;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transcoda_core::{load_config_or_default, validate_config, Config, ConfigError, LoggingConfig};

use cli::{Cli, Commands, SettingsCommand};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up before the config is checked, so config errors are logged too.
    let config = load_config_or_default(&cli.config);
    let logging = config
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli, config: Result<Config, ConfigError>) -> Result<ExitCode> {
    let config =
        config.with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;
    debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Commands::Convert(args) => commands::execute_convert(&config, args).await,
        Commands::Settings(SettingsCommand::Show { json }) => {
            commands::execute_settings_show(&config, json)
        }
        Commands::Settings(SettingsCommand::Set(args)) => {
            commands::execute_settings_set(&config, args)
        }
    }
}
