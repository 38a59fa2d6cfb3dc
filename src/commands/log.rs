//! `/log` — log a shot and suggest the next pump-zero
//!
//! Validation runs before anything touches the store and replies
//! ephemerally on bad input. The store round-trip happens behind a
//! deferred reply: persist (production only), fetch the history, filter,
//! estimate, then edit the reply with the result embed. Weakly correlated
//! history gets an ephemeral warning followup.

use tracing::{error, info};

use crate::commands::error_reply;
use crate::discord::server::BotState;
use crate::discord::{Interaction, InteractionResponse, ResponseData, User};
use crate::error::BotError;
use crate::estimator::{self, Estimate};
use crate::filter;
use crate::model::{NewRecord, Sample};
use crate::render;
use crate::store::RecordStore;
use crate::validation::{validate_log, AttachmentInfo, LogInput, ValidatedLog};

/// Result of the log pipeline, ready for presentation.
#[derive(Debug, Clone)]
pub struct LogOutcome {
    /// Count of eligible records including this submission
    pub submission_number: usize,
    pub estimate: Estimate,
}

pub async fn execute(state: BotState, interaction: Interaction) -> InteractionResponse {
    let Some(user) = interaction.invoker().cloned() else {
        return InteractionResponse::message(ResponseData::ephemeral_text(
            "Could not identify the submitting user.",
        ));
    };

    let input = parse_input(&interaction);
    let validated = match validate_log(&input, state.config.production) {
        Ok(v) => v,
        Err(err) => {
            return InteractionResponse::message(ResponseData::ephemeral_text(err.user_message()))
        }
    };

    // Store round-trips happen after the deferred ack
    let token = interaction.token.clone();
    tokio::spawn(async move {
        complete(state, token, user, validated).await;
    });
    InteractionResponse::deferred()
}

fn parse_input(interaction: &Interaction) -> LogInput {
    LogInput {
        predicted: interaction.option_f64("predicted").unwrap_or(0.0),
        actual: interaction.option_f64("actual").unwrap_or(0.0),
        pump_zero: interaction.option_f64("pump-zero").unwrap_or(0.0),
        build: interaction.option_str("build").map(String::from),
        attachment: interaction.option_attachment("photo").map(|a| AttachmentInfo {
            url: a.url.clone(),
            content_type: a.content_type.clone(),
            width: a.width,
            height: a.height,
        }),
        comments: interaction.option_str("comments").map(String::from),
    }
}

async fn complete(state: BotState, token: String, user: User, validated: ValidatedLog) {
    let user_tag = user.tag();
    match run_pipeline(
        state.store.as_ref(),
        &user_tag,
        &validated,
        state.config.production,
    )
    .await
    {
        Ok(outcome) => {
            info!(
                "{} logged shot, next pump-zero {} ({})",
                user_tag,
                render::round2(outcome.estimate.next),
                outcome.estimate.quality
            );
            let embed = render::log_embed(&user, &validated, outcome.submission_number, &outcome.estimate);
            let reply = ResponseData {
                embeds: Some(vec![embed]),
                ..ResponseData::default()
            };
            if let Err(e) = state.discord.edit_original(&token, &reply).await {
                error!("failed to edit /log reply: {:#}", e);
                return;
            }
            if outcome.estimate.likely_bad_data {
                let warning =
                    ResponseData::ephemeral_text(render::bad_data_warning(outcome.submission_number));
                if let Err(e) = state.discord.followup(&token, &warning).await {
                    error!("failed to send bad-data warning: {:#}", e);
                }
            }
        }
        Err(err) => {
            let reply = error_reply(&err);
            if let Err(e) = state.discord.edit_original(&token, &reply).await {
                error!("failed to report /log failure: {:#}", e);
            }
        }
    }
}

/// Persist (in production), fetch history, filter, and estimate.
///
/// The estimator sees only samples from records prior to this submission;
/// in production the just-created record is the newest fetched row and is
/// excluded again before fitting.
pub async fn run_pipeline(
    store: &dyn RecordStore,
    user_tag: &str,
    validated: &ValidatedLog,
    production: bool,
) -> Result<LogOutcome, BotError> {
    if production {
        store
            .create_record(&NewRecord {
                user: user_tag.to_string(),
                predicted: validated.predicted,
                actual: validated.actual,
                pump_zero: validated.pump_zero,
                build: validated.build.clone(),
            })
            .await?;
    }

    let records = store.fetch_records(user_tag).await?;
    let eligible = filter::eligible(&records);
    let mut samples: Vec<Sample> = eligible.iter().map(|r| r.sample()).collect();
    let submission_number = samples.len();
    if production && !samples.is_empty() {
        samples.remove(0);
    }

    let estimate = estimator::estimate(
        validated.predicted,
        validated.actual,
        validated.pump_zero,
        &samples,
    );
    Ok(LogOutcome {
        submission_number,
        estimate,
    })
}
