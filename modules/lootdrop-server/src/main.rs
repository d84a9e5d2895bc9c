use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use discord_api::DiscordApi;
use lootdrop_catalog::default_adapters;
use lootdrop_common::Config;
use lootdrop_scan::{DiscordNotifier, Scanner};
use lootdrop_server::{interactions, rest, scheduler, verify::RequestVerifier, AppState};
use lootdrop_store::{migrate, PgConfigStore, PgLedgerStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lootdrop=info".parse()?))
        .init();

    info!("lootdrop starting...");

    let config = Config::from_env();
    config.log_redacted();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    migrate(&pool).await?;

    let api = Arc::new(DiscordApi::new(
        config.discord_bot_token.clone(),
        config.discord_application_id.clone(),
    ));
    let configs = Arc::new(PgConfigStore::new(pool.clone()));
    let scanner = Arc::new(Scanner::new(
        default_adapters(),
        configs.clone(),
        Arc::new(PgLedgerStore::new(pool)),
        Arc::new(DiscordNotifier::new(api.clone())),
    ));

    scheduler::start_scan_interval(scanner.clone(), config.scan_interval_minutes);

    let verifier = RequestVerifier::new(&config.discord_public_key)?;
    let state = Arc::new(AppState {
        verifier,
        configs,
        scanner,
        api,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/interactions", post(interactions::handle))
        .route("/admin/scan", post(rest::trigger_scan))
        .route("/healthz", get(rest::healthz))
        .with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.web_host.as_str(), config.web_port)).await?;
    info!(host = config.web_host.as_str(), port = config.web_port, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
