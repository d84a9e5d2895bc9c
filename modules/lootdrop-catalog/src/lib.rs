// Catalog adapters: one per storefront, each normalizing that vendor's
// current free-promotion listing into `Promotion` records. Fetch and
// parse are split so parsing is testable against canned payloads.

pub mod adapter;
pub mod epic;
pub mod gog;
pub mod humble;
pub mod steam;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub use adapter::CatalogAdapter;

use lootdrop_common::Storefront;

/// Shared HTTP client for all adapters. Adapters own the scan's time
/// budget, so the timeout lives here rather than in the orchestrator.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent("lootdrop/0.1")
        .build()
        .unwrap_or_default()
}

/// One adapter per supported storefront, resolved once at startup.
pub fn default_adapters() -> HashMap<Storefront, Arc<dyn CatalogAdapter>> {
    let client = http_client();
    let mut adapters: HashMap<Storefront, Arc<dyn CatalogAdapter>> = HashMap::new();
    adapters.insert(
        Storefront::Epic,
        Arc::new(epic::EpicAdapter::new(client.clone())),
    );
    adapters.insert(
        Storefront::Steam,
        Arc::new(steam::SteamAdapter::new(client.clone())),
    );
    adapters.insert(
        Storefront::Gog,
        Arc::new(gog::GogAdapter::new(client.clone())),
    );
    adapters.insert(
        Storefront::Humble,
        Arc::new(humble::HumbleAdapter::new(client)),
    );
    adapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_storefront_has_an_adapter() {
        let adapters = default_adapters();
        for sf in Storefront::ALL {
            let adapter = adapters.get(&sf).expect("missing adapter");
            assert_eq!(adapter.storefront(), sf);
        }
    }
}
