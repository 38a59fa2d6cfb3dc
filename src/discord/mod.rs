//! Discord integration
//!
//! Wire types for the HTTP interactions model plus the REST client and the
//! axum endpoint that receives interaction callbacks. Only the payload
//! shapes this bot actually uses are modeled.

pub mod client;
pub mod server;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming interaction kinds.
pub mod interaction_type {
    pub const PING: u8 = 1;
    pub const APPLICATION_COMMAND: u8 = 2;
    pub const MESSAGE_COMPONENT: u8 = 3;
    pub const AUTOCOMPLETE: u8 = 4;
}

/// Outgoing callback kinds.
pub mod callback_type {
    pub const PONG: u8 = 1;
    pub const CHANNEL_MESSAGE: u8 = 4;
    pub const DEFERRED_CHANNEL_MESSAGE: u8 = 5;
    pub const UPDATE_MESSAGE: u8 = 7;
    pub const AUTOCOMPLETE_RESULT: u8 = 8;
}

/// Message flag marking a reply visible only to the invoking user.
pub const EPHEMERAL: u64 = 1 << 6;

/// An interaction callback delivered to the endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Interaction {
    /// The invoking user (guild interactions nest it under `member`).
    pub fn invoker(&self) -> Option<&User> {
        self.member
            .as_ref()
            .map(|m| &m.user)
            .or(self.user.as_ref())
    }

    /// Option value by name, if present.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_ref())
    }

    pub fn option_f64(&self, name: &str) -> Option<f64> {
        self.option(name).and_then(Value::as_f64)
    }

    pub fn option_u64(&self, name: &str) -> Option<u64> {
        self.option(name).and_then(Value::as_u64)
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(Value::as_str)
    }

    /// Attachment option resolved to its metadata.
    pub fn option_attachment(&self, name: &str) -> Option<&Attachment> {
        let id = self.option_str(name)?;
        self.data.as_ref()?.resolved.as_ref()?.attachments.get(id)
    }

    /// Value of the currently focused option during autocomplete.
    pub fn focused_value(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.focused.unwrap_or(false))
            .and_then(|o| o.value.as_ref())
            .and_then(Value::as_str)
    }
}

/// Command name, options, or component custom id of an interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
    #[serde(default)]
    pub resolved: Option<ResolvedData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub focused: Option<bool>,
}

/// Snowflake-keyed lookup tables for option values.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub attachments: HashMap<String, Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    /// Legacy-style user tag used as the per-user record scope.
    pub fn tag(&self) -> String {
        if self.discriminator.is_empty() || self.discriminator == "0" {
            self.username.clone()
        } else {
            format!("{}#{}", self.username, self.discriminator)
        }
    }

    /// CDN avatar URL, when the user has one set.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar
            .as_ref()
            .map(|hash| format!("https://cdn.discordapp.com/avatars/{}/{}.png", self.id, hash))
    }
}

/// Immediate response to an interaction callback.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: callback_type::PONG,
            data: None,
        }
    }

    pub fn deferred() -> Self {
        Self {
            kind: callback_type::DEFERRED_CHANNEL_MESSAGE,
            data: None,
        }
    }

    pub fn deferred_ephemeral() -> Self {
        Self {
            kind: callback_type::DEFERRED_CHANNEL_MESSAGE,
            data: Some(ResponseData {
                flags: Some(EPHEMERAL),
                ..ResponseData::default()
            }),
        }
    }

    pub fn message(data: ResponseData) -> Self {
        Self {
            kind: callback_type::CHANNEL_MESSAGE,
            data: Some(data),
        }
    }

    /// Edit the message the pressed component lives on.
    pub fn update_message(data: ResponseData) -> Self {
        Self {
            kind: callback_type::UPDATE_MESSAGE,
            data: Some(data),
        }
    }

    pub fn autocomplete(choices: Vec<AutocompleteChoice>) -> Self {
        Self {
            kind: callback_type::AUTOCOMPLETE_RESULT,
            data: Some(ResponseData {
                choices: Some(choices),
                ..ResponseData::default()
            }),
        }
    }
}

/// Body of a message-bearing response, also used for edits and followups.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<AutocompleteChoice>>,
}

impl ResponseData {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            flags: Some(EPHEMERAL),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: String,
}

/// Rich embed; only the fields the bot renders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

/// Container row for message components.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn buttons(components: Vec<Button>) -> Self {
        Self { kind: 1, components }
    }
}

/// Danger-style confirm button.
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    /// 4 = danger
    pub style: u8,
    pub label: String,
    pub custom_id: String,
    pub disabled: bool,
}

impl Button {
    pub fn danger(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: 2,
            style: 4,
            label: label.into(),
            custom_id: custom_id.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Slash-command registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDef>,
}

/// Application command option types used by this bot.
pub mod option_type {
    pub const STRING: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const NUMBER: u8 = 10;
    pub const ATTACHMENT: u8 = 11;
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandOptionDef {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub autocomplete: bool,
}

impl CommandOptionDef {
    pub fn new(kind: u8, name: &str, description: &str, required: bool) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required,
            autocomplete: false,
        }
    }

    pub fn with_autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tag_handles_both_username_systems() {
        let legacy = User {
            id: "1".into(),
            username: "barista".into(),
            discriminator: "0420".into(),
            avatar: None,
        };
        assert_eq!(legacy.tag(), "barista#0420");

        let pomelo = User {
            id: "2".into(),
            username: "barista".into(),
            discriminator: "0".into(),
            avatar: None,
        };
        assert_eq!(pomelo.tag(), "barista");
    }

    #[test]
    fn test_interaction_option_lookup() {
        let raw = serde_json::json!({
            "id": "123",
            "type": 2,
            "token": "tok",
            "data": {
                "name": "log",
                "options": [
                    { "name": "predicted", "value": 36.5 },
                    { "name": "build", "value": "abc123", "focused": true },
                    { "name": "photo", "value": "9001" }
                ],
                "resolved": {
                    "attachments": {
                        "9001": { "url": "https://cdn/x.png", "width": 10, "height": 10 }
                    }
                }
            },
            "member": {
                "user": { "id": "7", "username": "barista", "discriminator": "0" }
            }
        });
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert_eq!(interaction.option_f64("predicted"), Some(36.5));
        assert_eq!(interaction.option_str("build"), Some("abc123"));
        assert_eq!(interaction.focused_value(), Some("abc123"));
        assert_eq!(
            interaction.option_attachment("photo").map(|a| a.url.as_str()),
            Some("https://cdn/x.png")
        );
        assert_eq!(interaction.invoker().map(|u| u.tag()), Some("barista".into()));
    }

    #[test]
    fn test_response_serialization_skips_empty() {
        let resp = InteractionResponse::pong();
        assert_eq!(serde_json::to_value(&resp).unwrap(), serde_json::json!({"type": 1}));

        let resp = InteractionResponse::message(ResponseData::ephemeral_text("hi"));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["type"], 4);
        assert_eq!(v["data"]["flags"], 64);
        assert!(v["data"].get("embeds").is_none());
    }
}
