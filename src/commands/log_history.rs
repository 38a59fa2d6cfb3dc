//! `/log-history` — view history and drop bad records
//!
//! Without selectors this renders the user's eligible records as a table.
//! With `drop` or `drop-oldest` it shows the records staged for removal
//! behind a danger button; the drop is a soft delete (sets the exclude
//! flag) and only happens if the requesting user confirms within ten
//! seconds. On timeout the button is disabled and nothing mutates.

use tracing::{error, info, warn};

use crate::commands::error_reply;
use crate::confirm::{ConfirmOutcome, DROP_CONFIRM_WINDOW};
use crate::discord::server::BotState;
use crate::discord::{ActionRow, Button, Interaction, InteractionResponse, ResponseData};
use crate::error::BotError;
use crate::filter;
use crate::model::MeasurementRecord;
use crate::render;
use crate::store::RecordStore;

/// Selected slice of a user's history plus whether it is staged for a drop.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub selected: Vec<MeasurementRecord>,
    pub is_drop: bool,
}

pub async fn execute(state: BotState, interaction: Interaction) -> InteractionResponse {
    let Some(user) = interaction.invoker().cloned() else {
        return InteractionResponse::message(ResponseData::ephemeral_text(
            "Could not identify the requesting user.",
        ));
    };

    let drop_id = interaction.option_u64("drop");
    let drop_oldest = interaction.option_u64("drop-oldest").map(|n| n as usize);

    let token = interaction.token.clone();
    tokio::spawn(async move {
        complete(state, token, user, drop_id, drop_oldest).await;
    });
    InteractionResponse::deferred_ephemeral()
}

async fn complete(
    state: BotState,
    token: String,
    user: crate::discord::User,
    drop_id: Option<u64>,
    drop_oldest: Option<usize>,
) {
    let user_tag = user.tag();
    let view = match select_view(state.store.as_ref(), &user_tag, drop_id, drop_oldest).await {
        Ok(view) => view,
        Err(err) => {
            if let Err(e) = state.discord.edit_original(&token, &error_reply(&err)).await {
                error!("failed to report /log-history failure: {:#}", e);
            }
            return;
        }
    };

    let title = if view.is_drop {
        "Logs to Drop"
    } else {
        "Predictive Scale Test Log"
    };
    let refs: Vec<&MeasurementRecord> = view.selected.iter().collect();
    let content = render::code_block(&render::history_table(title, &refs));

    if !view.is_drop {
        let reply = ResponseData::text(content);
        if let Err(e) = state.discord.edit_original(&token, &reply).await {
            error!("failed to edit /log-history reply: {:#}", e);
        }
        return;
    }

    let record_ids: Vec<String> = view.selected.iter().map(|r| r.record_id.clone()).collect();
    let custom_id = state.confirms.register(&user.id, record_ids).await;

    let reply = ResponseData {
        content: Some(content),
        components: Some(drop_button_row(&custom_id, false)),
        ..ResponseData::default()
    };
    if let Err(e) = state.discord.edit_original(&token, &reply).await {
        error!("failed to present drop confirmation: {:#}", e);
        return;
    }

    // Bounded wait: if the timer wins the race the request is cancelled,
    // the button disabled, and no mutation happens
    let expiry_state = state.clone();
    let expiry_custom_id = custom_id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(DROP_CONFIRM_WINDOW).await;
        if !expiry_state.confirms.expire(&expiry_custom_id).await {
            return;
        }
        info!("drop confirmation timed out for {}", user_tag);
        let disabled = ResponseData {
            components: Some(drop_button_row(&expiry_custom_id, true)),
            ..ResponseData::default()
        };
        if let Err(e) = expiry_state.discord.edit_original(&token, &disabled).await {
            error!("failed to disable stale drop button: {:#}", e);
        }
        let notice = ResponseData::ephemeral_text(BotError::ConfirmationTimeout.user_message());
        if let Err(e) = expiry_state.discord.followup(&token, &notice).await {
            error!("failed to send timeout notice: {:#}", e);
        }
    });
}

/// Handle the confirm button press for a pending drop.
pub async fn handle_confirm(state: BotState, interaction: Interaction) -> InteractionResponse {
    let Some(custom_id) = interaction
        .data
        .as_ref()
        .and_then(|d| d.custom_id.clone())
    else {
        return InteractionResponse::message(ResponseData::ephemeral_text(
            "Unsupported interaction.",
        ));
    };
    let Some(user) = interaction.invoker().cloned() else {
        return InteractionResponse::message(ResponseData::ephemeral_text(
            "Could not identify the confirming user.",
        ));
    };

    match state.confirms.try_confirm(&custom_id, &user.id).await {
        ConfirmOutcome::Confirmed(record_ids) => {
            if let Err(e) = state.store.set_excluded(&record_ids).await {
                error!("drop update failed: {:#}", e);
                return InteractionResponse::message(ResponseData::ephemeral_text(
                    BotError::Upstream(e).user_message(),
                ));
            }
            info!("{} dropped {} records", user.tag(), record_ids.len());

            let token = interaction.token.clone();
            let followup_state = state.clone();
            tokio::spawn(async move {
                let notice = ResponseData::ephemeral_text("Success, dropped logs!");
                if let Err(e) = followup_state.discord.followup(&token, &notice).await {
                    error!("failed to send drop acknowledgement: {:#}", e);
                }
            });

            // Disable the affordance on the message the button lives on
            InteractionResponse::update_message(ResponseData {
                components: Some(drop_button_row(&custom_id, true)),
                ..ResponseData::default()
            })
        }
        ConfirmOutcome::WrongUser => InteractionResponse::message(ResponseData::ephemeral_text(
            "Only the user who requested this drop can confirm it.",
        )),
        ConfirmOutcome::Unknown => {
            warn!("confirmation for inactive drop request: {}", custom_id);
            InteractionResponse::message(ResponseData::ephemeral_text(
                "This drop request is no longer active.",
            ))
        }
    }
}

/// Fetch, filter, and narrow the history per the drop selectors.
pub async fn select_view(
    store: &dyn RecordStore,
    user_tag: &str,
    drop_id: Option<u64>,
    drop_oldest: Option<usize>,
) -> Result<HistoryView, BotError> {
    // A zero selector means the same as leaving the option out: record ids
    // start at 1 and dropping zero records is not a drop
    let drop_id = drop_id.filter(|id| *id != 0);
    let drop_oldest = drop_oldest.filter(|n| *n != 0);

    let records = store.fetch_records(user_tag).await?;
    let eligible = filter::eligible(&records);
    let selected = filter::select_for_drop(&eligible, drop_id, drop_oldest);

    if selected.is_empty() {
        return Err(BotError::EmptyResult);
    }

    Ok(HistoryView {
        selected: selected.into_iter().cloned().collect(),
        is_drop: drop_id.is_some() || drop_oldest.is_some(),
    })
}

fn drop_button_row(custom_id: &str, disabled: bool) -> Vec<ActionRow> {
    let mut button = Button::danger("Drop", custom_id);
    if disabled {
        button = button.disabled();
    }
    vec![ActionRow::buttons(vec![button])]
}
