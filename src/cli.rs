//! CLI interface for pumpzero-bot

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::cache::TtlCache;
use crate::commands;
use crate::config::Config;
use crate::confirm::ConfirmRegistry;
use crate::discord::client::DiscordClient;
use crate::discord::server::{self, BotState};
use crate::github::BranchService;
use crate::store::AirtableStore;

#[derive(Parser)]
#[command(name = "pumpzero-bot")]
#[command(about = "Predictive-scale calibration logging bot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the slash commands and serve the interactions endpoint (default)
    Run,
    /// Register the slash commands with Discord, then exit
    Register,
    /// Inspect or scaffold the configuration file
    Config {
        /// Print the resolved configuration
        #[arg(long)]
        show: bool,
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await,
        Commands::Register => register_commands(config).await,
        Commands::Config { show, init } => config_command(config, show, init),
    }
}

async fn run_bot(config: Config) -> Result<()> {
    config.validate_for_run()?;
    let config = Arc::new(config);

    let discord = DiscordClient::new(config.discord.clone())?;
    discord
        .register_commands(&commands::definitions(config.production))
        .await?;

    let state = BotState {
        store: Arc::new(AirtableStore::new(config.airtable.clone())?),
        discord,
        confirms: Arc::new(ConfirmRegistry::new()),
        branches: Arc::new(BranchService::new(
            config.github.clone(),
            Arc::new(TtlCache::new()),
        )?),
        config,
    };

    server::start(state).await
}

async fn register_commands(config: Config) -> Result<()> {
    config.validate_for_run()?;
    let discord = DiscordClient::new(config.discord.clone())?;
    discord
        .register_commands(&commands::definitions(config.production))
        .await?;
    info!("commands registered");
    Ok(())
}

fn config_command(config: Config, show: bool, init: bool) -> Result<()> {
    let path = Config::config_path()?;
    if init && !path.exists() {
        config.save()?;
        println!("Wrote default config to {}", path.display());
    }
    if show || !init {
        println!("Config file: {}", path.display());
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
