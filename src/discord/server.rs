//! Interactions endpoint
//!
//! Discord delivers every slash command, autocomplete query, and button
//! press as a signed HTTP callback. The endpoint verifies the ed25519
//! signature over `timestamp || body`, answers PING, and hands everything
//! else to the command dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use ring::signature::{UnparsedPublicKey, ED25519};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::commands;
use crate::config::Config;
use crate::confirm::ConfirmRegistry;
use crate::discord::client::DiscordClient;
use crate::discord::{interaction_type, Interaction, InteractionResponse};
use crate::github::BranchService;
use crate::store::RecordStore;

/// Shared state handed to every interaction handler.
#[derive(Clone)]
pub struct BotState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
    pub discord: DiscordClient,
    pub confirms: Arc<ConfirmRegistry>,
    pub branches: Arc<BranchService>,
}

/// Serve the interactions endpoint until shutdown.
pub async fn start(state: BotState) -> Result<()> {
    let addr: SocketAddr = state
        .config
        .discord
        .bind_addr
        .parse()
        .context("Invalid bind address")?;

    let app = Router::new()
        .route("/interactions", post(interactions_handler))
        .route("/healthz", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("interactions endpoint listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind interactions endpoint")?;
    axum::serve(listener, app)
        .await
        .context("Interactions server failed")?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "version": crate::VERSION }))
}

async fn interactions_handler(
    State(state): State<BotState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("X-Signature-Ed25519")
        .and_then(|v| v.to_str().ok());
    let timestamp = headers
        .get("X-Signature-Timestamp")
        .and_then(|v| v.to_str().ok());

    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return (StatusCode::UNAUTHORIZED, "missing signature headers").into_response();
    };

    if !verify_signature(&state.config.discord.public_key, signature, timestamp, &body) {
        warn!("rejected interaction with invalid signature");
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(i) => i,
        Err(e) => {
            warn!("unparseable interaction payload: {}", e);
            return (StatusCode::BAD_REQUEST, "bad payload").into_response();
        }
    };

    if interaction.kind == interaction_type::PING {
        return Json(InteractionResponse::pong()).into_response();
    }

    let response = commands::dispatch(state, interaction).await;
    Json(response).into_response()
}

/// Check the ed25519 signature Discord attaches to every callback.
fn verify_signature(public_key_hex: &str, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
    let Ok(public_key) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    UnparsedPublicKey::new(&ED25519, public_key)
        .verify(&message, &signature)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};

    fn keypair() -> Ed25519KeyPair {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap()
    }

    #[test]
    fn test_valid_signature_accepted() {
        let key = keypair();
        let public_hex = hex::encode(key.public_key().as_ref());
        let timestamp = "1700000000";
        let body = br#"{"type":1}"#;

        let mut message = Vec::new();
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        let signature_hex = hex::encode(key.sign(&message).as_ref());

        assert!(verify_signature(&public_hex, &signature_hex, timestamp, body));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let key = keypair();
        let public_hex = hex::encode(key.public_key().as_ref());
        let timestamp = "1700000000";

        let mut message = Vec::new();
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(br#"{"type":1}"#);
        let signature_hex = hex::encode(key.sign(&message).as_ref());

        assert!(!verify_signature(
            &public_hex,
            &signature_hex,
            timestamp,
            br#"{"type":2}"#
        ));
    }

    #[test]
    fn test_garbage_hex_rejected() {
        assert!(!verify_signature("zz", "zz", "0", b""));
    }
}
