//! Discord REST client
//!
//! Registers the slash commands and drives the interaction webhook
//! endpoints (edit the deferred original reply, post followups).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DiscordConfig;
use crate::discord::{CommandDef, ResponseData};

/// How many times a 404 on the deferred original reply is retried.
const EDIT_RETRY_LIMIT: u32 = 3;

/// Pause between those retries.
const EDIT_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(250);

/// Only a not-yet-registered deferred reply is worth retrying; every other
/// failure status is final.
fn retry_edit(status: reqwest::StatusCode, attempt: u32) -> bool {
    status == reqwest::StatusCode::NOT_FOUND && attempt < EDIT_RETRY_LIMIT
}

/// REST client scoped to one application.
#[derive(Debug, Clone)]
pub struct DiscordClient {
    config: DiscordConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RegisteredCommand {
    #[allow(dead_code)]
    id: String,
    name: String,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, http_client })
    }

    fn commands_url(&self) -> String {
        match &self.config.guild_id {
            Some(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.config.api_base, self.config.application_id, guild
            ),
            None => format!(
                "{}/applications/{}/commands",
                self.config.api_base, self.config.application_id
            ),
        }
    }

    /// Bulk-overwrite the application commands.
    pub async fn register_commands(&self, commands: &[CommandDef]) -> Result<()> {
        info!("refreshing {} application (/) commands", commands.len());

        let response = self
            .http_client
            .put(self.commands_url())
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .json(commands)
            .send()
            .await
            .context("Failed to connect to Discord API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Discord command registration failed ({}): {}", status, body);
        }

        let registered: Vec<RegisteredCommand> = response
            .json()
            .await
            .context("Failed to parse Discord response")?;
        info!(
            "successfully reloaded {} application (/) commands: {:?}",
            registered.len(),
            registered.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Replace the deferred original reply of an interaction.
    ///
    /// A fast worker can reach this before Discord has registered the
    /// deferred reply, which surfaces as a 404; those are retried briefly.
    pub async fn edit_original(&self, token: &str, data: &ResponseData) -> Result<()> {
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.config.api_base, self.config.application_id, token
        );
        debug!("editing original interaction reply");

        let mut attempt = 0;
        loop {
            let response = self
                .http_client
                .patch(&url)
                .json(data)
                .send()
                .await
                .context("Failed to edit interaction reply")?;

            if response.status().is_success() {
                return Ok(());
            }
            let status = response.status();
            if retry_edit(status, attempt) {
                attempt += 1;
                debug!("original reply not visible yet, retry {}", attempt);
                tokio::time::sleep(EDIT_RETRY_DELAY).await;
                continue;
            }
            let body = response.text().await.unwrap_or_default();
            bail!("Discord edit failed ({}): {}", status, body);
        }
    }

    /// Post a followup message on an interaction.
    pub async fn followup(&self, token: &str, data: &ResponseData) -> Result<()> {
        let url = format!(
            "{}/webhooks/{}/{}",
            self.config.api_base, self.config.application_id, token
        );
        debug!("sending interaction followup");

        let response = self
            .http_client
            .post(&url)
            .json(data)
            .send()
            .await
            .context("Failed to send interaction followup")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Discord followup failed ({}): {}", status, body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

    fn config(guild: Option<&str>) -> DiscordConfig {
        DiscordConfig {
            application_id: "111".to_string(),
            public_key: "ab".repeat(32),
            bot_token: "token".to_string(),
            guild_id: guild.map(String::from),
            api_base: DISCORD_API_BASE.to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }

    #[test]
    fn test_global_commands_url() {
        let client = DiscordClient::new(config(None)).unwrap();
        assert_eq!(
            client.commands_url(),
            "https://discord.com/api/v10/applications/111/commands"
        );
    }

    #[test]
    fn test_guild_commands_url() {
        let client = DiscordClient::new(config(Some("222"))).unwrap();
        assert_eq!(
            client.commands_url(),
            "https://discord.com/api/v10/applications/111/guilds/222/commands"
        );
    }

    #[test]
    fn test_edit_retries_only_early_not_found() {
        use reqwest::StatusCode;

        assert!(retry_edit(StatusCode::NOT_FOUND, 0));
        assert!(retry_edit(StatusCode::NOT_FOUND, EDIT_RETRY_LIMIT - 1));
        // Retries are bounded
        assert!(!retry_edit(StatusCode::NOT_FOUND, EDIT_RETRY_LIMIT));
        // Other failures are final immediately
        assert!(!retry_edit(StatusCode::UNAUTHORIZED, 0));
        assert!(!retry_edit(StatusCode::INTERNAL_SERVER_ERROR, 0));
    }
}
