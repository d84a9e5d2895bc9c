pub mod commands;
pub mod interactions;
pub mod rest;
pub mod scheduler;
pub mod verify;

use std::sync::Arc;

use discord_api::DiscordApi;
use lootdrop_common::Config;
use lootdrop_scan::Scanner;
use lootdrop_store::ConfigStore;

use crate::verify::RequestVerifier;

/// Shared state behind the axum router.
pub struct AppState {
    pub config: Config,
    pub verifier: RequestVerifier,
    pub configs: Arc<dyn ConfigStore>,
    pub scanner: Arc<Scanner>,
    pub api: Arc<DiscordApi>,
}
