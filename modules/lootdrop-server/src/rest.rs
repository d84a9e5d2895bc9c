use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use lootdrop_common::LootdropError;

use crate::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

/// Operator-facing scan trigger: 202 with the run id the scan will
/// log under, 409 when a scan already holds the lock. The probe is
/// read-only; the spawned run still acquires the lock itself, so a
/// race between two triggers resolves to one runner and one
/// dropped-with-log duplicate.
pub async fn trigger_scan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if !check_admin_auth(
        &headers,
        &state.config.admin_username,
        &state.config.admin_password,
    ) {
        return Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(header::WWW_AUTHENTICATE, "Basic realm=\"admin\"")
            .body(axum::body::Body::from("Unauthorized"))
            .unwrap()
            .into_response();
    }

    match state.scanner.is_running().await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(serde_json::json!({"error": "Scan already in progress"})),
            )
                .into_response();
        }
        Err(e) => {
            warn!(error = %e, "Failed to check scan lock");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to check scan lock"})),
            )
                .into_response();
        }
        Ok(false) => {}
    }

    let scan_id = Uuid::new_v4();
    let scanner = state.scanner.clone();

    tokio::spawn(async move {
        match scanner.run(scan_id).await {
            Ok(stats) => info!(scan_id = %scan_id, "Admin-triggered scan complete. {stats}"),
            Err(LootdropError::ScanLockHeld) => {
                info!(scan_id = %scan_id, "Admin-triggered scan dropped, lock held")
            }
            Err(e) => error!(scan_id = %scan_id, error = %e, "Admin-triggered scan failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"status": "started", "scan_id": scan_id})),
    )
        .into_response()
}

fn check_admin_auth(headers: &HeaderMap, username: &str, password: &str) -> bool {
    use base64::Engine;

    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        return false;
    };
    let Ok(auth_str) = auth.to_str() else {
        return false;
    };
    let Some(encoded) = auth_str.strip_prefix("Basic ") else {
        return false;
    };

    let Ok(decoded_bytes) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded_bytes) else {
        return false;
    };

    let expected = format!("{username}:{password}");
    constant_time_eq(decoded.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use ed25519_dalek::SigningKey;

    use discord_api::DiscordApi;
    use lootdrop_common::Config;
    use lootdrop_scan::{NoopNotifier, Scanner};
    use lootdrop_store::{LedgerStore, MemoryConfigStore, MemoryLedgerStore};

    use crate::verify::RequestVerifier;

    fn test_state(ledger_store: Arc<MemoryLedgerStore>) -> Arc<AppState> {
        let configs = Arc::new(MemoryConfigStore::new());
        let scanner = Arc::new(Scanner::new(
            HashMap::new(),
            configs.clone(),
            ledger_store,
            Arc::new(NoopNotifier),
        ));
        let signing = SigningKey::from_bytes(&[1u8; 32]);
        Arc::new(AppState {
            config: Config {
                database_url: "postgres://unused".to_string(),
                discord_bot_token: "test-token".to_string(),
                discord_application_id: "app-1".to_string(),
                discord_public_key: String::new(),
                web_host: "127.0.0.1".to_string(),
                web_port: 0,
                scan_interval_minutes: 30,
                admin_username: "admin".to_string(),
                admin_password: "hunter2".to_string(),
            },
            verifier: RequestVerifier::new(&hex::encode(signing.verifying_key().as_bytes()))
                .unwrap(),
            configs,
            scanner,
            api: Arc::new(DiscordApi::new(
                "test-token".to_string(),
                "app-1".to_string(),
            )),
        })
    }

    fn basic_auth_headers(username: &str, password: &str) -> HeaderMap {
        use base64::Engine;

        let mut headers = HeaderMap::new();
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {encoded}").parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn trigger_scan_requires_auth() {
        let state = test_state(Arc::new(MemoryLedgerStore::new()));
        let response = trigger_scan(State(state), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn trigger_scan_acknowledges_with_the_scan_id() {
        let state = test_state(Arc::new(MemoryLedgerStore::new()));
        let response =
            trigger_scan(State(state), basic_auth_headers("admin", "hunter2")).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "started");
        assert!(json["scan_id"].as_str().unwrap().parse::<Uuid>().is_ok());
    }

    #[tokio::test]
    async fn trigger_scan_reports_conflict_while_a_scan_holds_the_lock() {
        let ledger_store = Arc::new(MemoryLedgerStore::new());
        assert!(ledger_store.try_acquire_scan_lock().await.unwrap());

        let state = test_state(ledger_store.clone());
        let response =
            trigger_scan(State(state), basic_auth_headers("admin", "hunter2")).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        // The probe is read-only: the running scan keeps its lock.
        assert!(ledger_store.is_locked());
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secres"));
        assert!(!constant_time_eq(b"secret", b"secre"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn admin_auth_accepts_the_right_credentials() {
        use base64::Engine;

        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode("admin:hunter2");
        headers.insert(
            header::AUTHORIZATION,
            format!("Basic {encoded}").parse().unwrap(),
        );
        assert!(check_admin_auth(&headers, "admin", "hunter2"));
        assert!(!check_admin_auth(&headers, "admin", "other"));

        headers.insert(header::AUTHORIZATION, "Bearer token".parse().unwrap());
        assert!(!check_admin_auth(&headers, "admin", "hunter2"));
    }
}
