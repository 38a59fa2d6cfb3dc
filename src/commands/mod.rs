//! Slash commands
//!
//! Command definitions for registration plus the dispatcher that routes
//! incoming interactions (commands, autocomplete, button presses) to the
//! right handler and maps errors to user-facing replies.

pub mod log;
pub mod log_history;

use tracing::{error, warn};

use crate::discord::server::BotState;
use crate::discord::{
    interaction_type, option_type, CommandDef, CommandOptionDef, Interaction, InteractionResponse,
    ResponseData,
};
use crate::error::BotError;

/// The commands this bot registers. In production the build tag and photo
/// are required; outside it they are optional with dev defaults.
pub fn definitions(production: bool) -> Vec<CommandDef> {
    vec![
        CommandDef {
            name: "log".to_string(),
            description: "logs a predictive scale shot".to_string(),
            options: vec![
                CommandOptionDef::new(
                    option_type::NUMBER,
                    "predicted",
                    "predicted shot weight (grams)",
                    true,
                ),
                CommandOptionDef::new(
                    option_type::NUMBER,
                    "actual",
                    "actual shot weight (grams)",
                    true,
                ),
                CommandOptionDef::new(
                    option_type::NUMBER,
                    "pump-zero",
                    "pump zero config value",
                    true,
                ),
                CommandOptionDef::new(
                    option_type::STRING,
                    "build",
                    "git version hash",
                    production,
                )
                .with_autocomplete(),
                CommandOptionDef::new(
                    option_type::ATTACHMENT,
                    "photo",
                    "photo of display during shot",
                    production,
                ),
                CommandOptionDef::new(
                    option_type::STRING,
                    "comments",
                    "important notes to share during the shot",
                    false,
                ),
            ],
        },
        CommandDef {
            name: "log-history".to_string(),
            description: "view/manage predictive scale history".to_string(),
            options: vec![
                CommandOptionDef::new(
                    option_type::INTEGER,
                    "drop-oldest",
                    "drop the oldest N records",
                    false,
                ),
                CommandOptionDef::new(
                    option_type::INTEGER,
                    "drop",
                    "drop a specific record",
                    false,
                ),
            ],
        },
    ]
}

/// Route one interaction to its handler.
pub async fn dispatch(state: BotState, interaction: Interaction) -> InteractionResponse {
    match interaction.kind {
        interaction_type::AUTOCOMPLETE => autocomplete(state, interaction).await,
        interaction_type::APPLICATION_COMMAND => {
            let name = interaction
                .data
                .as_ref()
                .and_then(|d| d.name.clone())
                .unwrap_or_default();
            match name.as_str() {
                "log" => log::execute(state.clone(), interaction).await,
                "log-history" => log_history::execute(state.clone(), interaction).await,
                other => {
                    warn!("unknown command: {}", other);
                    InteractionResponse::message(ResponseData::ephemeral_text(
                        "Unknown command.",
                    ))
                }
            }
        }
        interaction_type::MESSAGE_COMPONENT => {
            log_history::handle_confirm(state, interaction).await
        }
        other => {
            warn!("unhandled interaction type: {}", other);
            InteractionResponse::message(ResponseData::ephemeral_text("Unsupported interaction."))
        }
    }
}

async fn autocomplete(state: BotState, interaction: Interaction) -> InteractionResponse {
    let focused = interaction.focused_value().unwrap_or("");
    match state.branches.autocomplete(focused).await {
        Ok(choices) => InteractionResponse::autocomplete(choices),
        Err(e) => {
            // Autocomplete is best-effort; an empty list degrades gracefully
            warn!("branch autocomplete failed: {:#}", e);
            InteractionResponse::autocomplete(Vec::new())
        }
    }
}

/// Reply body for a failed deferred command.
pub fn error_reply(err: &BotError) -> ResponseData {
    if let BotError::Upstream(inner) = err {
        error!("upstream failure: {:#}", inner);
    }
    ResponseData::text(err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_toggle_required_options() {
        let prod = definitions(true);
        let log = prod.iter().find(|c| c.name == "log").unwrap();
        let build = log.options.iter().find(|o| o.name == "build").unwrap();
        let photo = log.options.iter().find(|o| o.name == "photo").unwrap();
        assert!(build.required && photo.required);
        assert!(build.autocomplete);

        let dev = definitions(false);
        let log = dev.iter().find(|c| c.name == "log").unwrap();
        assert!(!log.options.iter().find(|o| o.name == "build").unwrap().required);
    }

    #[test]
    fn test_history_selectors_are_optional() {
        let defs = definitions(true);
        let history = defs.iter().find(|c| c.name == "log-history").unwrap();
        assert!(history.options.iter().all(|o| !o.required));
    }
}
