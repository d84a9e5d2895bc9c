use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, warn};

use discord_api::{
    types::{INTERACTION_APPLICATION_COMMAND, INTERACTION_PING},
    Interaction, InteractionResponse, MessagePayload,
};
use lootdrop_common::LootdropError;

use crate::commands::{self, Command};
use crate::AppState;

/// The interactions endpoint. Signature first, parsing second: the
/// raw body bytes are what Discord signed.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = header_str(&headers, "x-signature-ed25519");
    let timestamp = header_str(&headers, "x-signature-timestamp");
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    if !state.verifier.verify(timestamp, &body, signature) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(error = %e, "Interaction body did not parse");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match interaction.kind {
        INTERACTION_PING => Json(InteractionResponse::pong()).into_response(),
        INTERACTION_APPLICATION_COMMAND => dispatch_command(state, interaction).await,
        other => {
            warn!(kind = other, "Unsupported interaction type");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

async fn dispatch_command(state: Arc<AppState>, interaction: Interaction) -> Response {
    let Some(guild_id) = interaction.guild_id.clone() else {
        return Json(InteractionResponse::ephemeral(
            "This command only works inside a server.",
        ))
        .into_response();
    };
    let Some(data) = interaction.data.as_ref() else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let command = match Command::parse(data) {
        Ok(command) => command,
        Err(e) => {
            warn!(guild = guild_id.as_str(), error = %e, "Command did not decode");
            return Json(InteractionResponse::ephemeral(
                "Sorry, I did not understand that command.",
            ))
            .into_response();
        }
    };

    if command == Command::Check {
        return manual_scan(state, interaction.token).await;
    }

    info!(guild = guild_id.as_str(), ?command, "Applying config command");
    match commands::apply(state.configs.as_ref(), &guild_id, command).await {
        Ok(reply) => Json(InteractionResponse::ephemeral(reply)).into_response(),
        Err(e) => {
            // One guild's broken record must not look like an outage;
            // report and move on.
            error!(guild = guild_id.as_str(), error = %e, "Config command failed");
            Json(InteractionResponse::ephemeral(
                "Something went wrong applying that change. Try again in a moment.",
            ))
            .into_response()
        }
    }
}

/// The `check` command: acknowledge immediately, run the scan as a
/// detached task, and edit the original response when it finishes.
/// The follow-up is best effort: the token expires and the edit may
/// fail; the scan's results stand regardless.
async fn manual_scan(state: Arc<AppState>, token: String) -> Response {
    let scanner = state.scanner.clone();
    let api = state.api.clone();
    let scan_id = uuid::Uuid::new_v4();

    tokio::spawn(async move {
        let text = match scanner.run(scan_id).await {
            Ok(stats) => {
                info!(scan_id = %scan_id, "Manual scan complete. {stats}");
                format!("Scan complete: {}.", stats.summary())
            }
            Err(LootdropError::ScanLockHeld) => {
                "A scan is already running; it will pick up anything new.".to_string()
            }
            Err(e) => {
                error!(scan_id = %scan_id, error = %e, "Manual scan failed");
                "The scan hit an error. Check the server logs.".to_string()
            }
        };

        let payload = MessagePayload {
            content: Some(text),
            ..MessagePayload::default()
        };
        if let Err(e) = api.edit_original_response(&token, &payload).await {
            warn!(error = %e, "Manual scan follow-up could not be delivered");
        }
    });

    Json(InteractionResponse::deferred()).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use ed25519_dalek::{Signer, SigningKey};

    use discord_api::DiscordApi;
    use lootdrop_common::Config;
    use lootdrop_scan::{NoopNotifier, Scanner};
    use lootdrop_store::{ConfigStore, MemoryConfigStore, MemoryLedgerStore};

    use crate::verify::RequestVerifier;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            discord_bot_token: "test-token".to_string(),
            discord_application_id: "app-1".to_string(),
            discord_public_key: String::new(),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
            scan_interval_minutes: 30,
            admin_username: "admin".to_string(),
            admin_password: "hunter2".to_string(),
        }
    }

    fn test_state(signing: &SigningKey) -> (Arc<AppState>, Arc<MemoryConfigStore>) {
        let configs = Arc::new(MemoryConfigStore::new());
        let scanner = Arc::new(Scanner::new(
            HashMap::new(),
            configs.clone(),
            Arc::new(MemoryLedgerStore::new()),
            Arc::new(NoopNotifier),
        ));
        let verifier =
            RequestVerifier::new(&hex::encode(signing.verifying_key().as_bytes())).unwrap();
        let state = Arc::new(AppState {
            config: test_config(),
            verifier,
            configs: configs.clone(),
            scanner,
            api: Arc::new(DiscordApi::new(
                "test-token".to_string(),
                "app-1".to_string(),
            )),
        });
        (state, configs)
    }

    fn signed_headers(signing: &SigningKey, timestamp: &str, body: &[u8]) -> HeaderMap {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        let mut headers = HeaderMap::new();
        headers.insert("x-signature-ed25519", signature.parse().unwrap());
        headers.insert("x-signature-timestamp", timestamp.parse().unwrap());
        headers
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let signing = SigningKey::from_bytes(&[3u8; 32]);
        let (state, _) = test_state(&signing);
        let body = br#"{"id": "1", "type": 1, "token": "tok"}"#;

        let response = handle(
            State(state),
            signed_headers(&signing, "1754300000", body),
            Bytes::from_static(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["type"], 1);
    }

    #[tokio::test]
    async fn unsigned_and_badly_signed_requests_are_rejected() {
        let signing = SigningKey::from_bytes(&[3u8; 32]);
        let (state, _) = test_state(&signing);
        let body = br#"{"id": "1", "type": 1, "token": "tok"}"#;

        let response = handle(
            State(state.clone()),
            HeaderMap::new(),
            Bytes::from_static(body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let other = SigningKey::from_bytes(&[4u8; 32]);
        let response = handle(
            State(state),
            signed_headers(&other, "1754300000", body),
            Bytes::from_static(body),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn setup_command_writes_the_config_record() {
        let signing = SigningKey::from_bytes(&[3u8; 32]);
        let (state, configs) = test_state(&signing);
        let body = br#"{
            "id": "1",
            "type": 2,
            "token": "tok",
            "guild_id": "42",
            "data": {
                "name": "freegames",
                "options": [{
                    "name": "setup",
                    "type": 1,
                    "options": [{"name": "channel", "type": 7, "value": "100"}]
                }]
            }
        }"#;

        let response = handle(
            State(state),
            signed_headers(&signing, "1754300000", body),
            Bytes::from_static(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["flags"], 64);

        let config = configs.get("42").await.unwrap().unwrap();
        assert_eq!(config.channel_id, "100");
    }

    #[tokio::test]
    async fn command_outside_a_guild_is_refused_politely() {
        let signing = SigningKey::from_bytes(&[3u8; 32]);
        let (state, _) = test_state(&signing);
        let body = br#"{
            "id": "1",
            "type": 2,
            "token": "tok",
            "data": {"name": "freegames", "options": [{"name": "status", "type": 1}]}
        }"#;

        let response = handle(
            State(state),
            signed_headers(&signing, "1754300000", body),
            Bytes::from_static(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["type"], 4);
    }

    #[tokio::test]
    async fn manual_check_defers_immediately() {
        let signing = SigningKey::from_bytes(&[3u8; 32]);
        let (state, _) = test_state(&signing);
        let body = br#"{
            "id": "1",
            "type": 2,
            "token": "tok",
            "guild_id": "42",
            "data": {"name": "freegames", "options": [{"name": "check", "type": 1}]}
        }"#;

        let response = handle(
            State(state),
            signed_headers(&signing, "1754300000", body),
            Bytes::from_static(body),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["type"], 5);
    }
}
