//! Configuration management
//!
//! Settings load from `config.toml` under the user config directory with
//! environment-variable overrides for the secrets (bot token, store API
//! key), so nothing sensitive has to live on disk.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discord application settings
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Airtable record store settings
    #[serde(default)]
    pub airtable: AirtableConfig,
    /// GitHub repo used for build-tag autocomplete
    #[serde(default)]
    pub github: GithubConfig,
    /// Production mode: build/photo become required and records persist
    #[serde(default)]
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Application (client) id
    #[serde(default)]
    pub application_id: String,
    /// Hex-encoded ed25519 public key for interaction signatures
    #[serde(default)]
    pub public_key: String,
    /// Bot token; normally supplied via DISCORD_TOKEN
    #[serde(skip)]
    pub bot_token: String,
    /// Register commands to one guild instead of globally (faster rollout)
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Discord API base URL
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
    /// Address the interactions endpoint binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            public_key: String::new(),
            bot_token: String::new(),
            guild_id: None,
            api_base: default_discord_api_base(),
            bind_addr: default_bind_addr(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirtableConfig {
    /// API key; normally supplied via AIRTABLE_API_KEY
    #[serde(skip)]
    pub api_key: String,
    /// Base id (app…)
    #[serde(default = "default_airtable_base_id")]
    pub base_id: String,
    /// Table name holding the measurement records
    #[serde(default = "default_airtable_table")]
    pub table: String,
    /// Airtable API base URL
    #[serde(default = "default_airtable_api_base")]
    pub api_base: String,
}

fn default_airtable_base_id() -> String {
    "appVJDLktxcKImcay".to_string()
}

fn default_airtable_table() -> String {
    "Predicative Scale Tests".to_string()
}

fn default_airtable_api_base() -> String {
    "https://api.airtable.com/v0".to_string()
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_id: default_airtable_base_id(),
            table: default_airtable_table(),
            api_base: default_airtable_api_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Repository owner
    #[serde(default = "default_github_owner")]
    pub owner: String,
    /// Repository name
    #[serde(default = "default_github_repo")]
    pub repo: String,
    /// GitHub API base URL
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
}

fn default_github_owner() -> String {
    "Zer0-bit".to_string()
}

fn default_github_repo() -> String {
    "gaggiuino".to_string()
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: default_github_owner(),
            repo: default_github_repo(),
            api_base: default_github_api_base(),
        }
    }
}

impl Config {
    /// Path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("pumpzero-bot").join("config.toml"))
    }

    /// Load from the config file (if present) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment variables override file values; secrets only come from here.
    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("DISCORD_TOKEN") {
            self.discord.bot_token = v;
        }
        if let Ok(v) = std::env::var("DISCORD_CLIENT_ID") {
            self.discord.application_id = v;
        }
        if let Ok(v) = std::env::var("DISCORD_PUBLIC_KEY") {
            self.discord.public_key = v;
        }
        if let Ok(v) = std::env::var("DISCORD_GUILD_ID") {
            self.discord.guild_id = Some(v);
        }
        if let Ok(v) = std::env::var("AIRTABLE_API_KEY") {
            self.airtable.api_key = v;
        }
        if let Ok(v) = std::env::var("BOT_ENV") {
            self.production = v == "production";
        }
    }

    /// Write the non-secret settings to the config file.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config at {}", path.display()))?;
        Ok(())
    }

    /// Basic sanity check before starting the endpoint.
    pub fn validate_for_run(&self) -> Result<()> {
        anyhow::ensure!(
            !self.discord.application_id.is_empty(),
            "Discord application id not configured (DISCORD_CLIENT_ID)"
        );
        anyhow::ensure!(
            !self.discord.public_key.is_empty(),
            "Discord public key not configured (DISCORD_PUBLIC_KEY)"
        );
        anyhow::ensure!(
            !self.discord.bot_token.is_empty(),
            "Discord bot token not configured (DISCORD_TOKEN)"
        );
        if self.production {
            anyhow::ensure!(
                !self.airtable.api_key.is_empty(),
                "Airtable API key not configured (AIRTABLE_API_KEY)"
            );
        }
        Ok(())
    }
}
