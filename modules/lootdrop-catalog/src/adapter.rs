use anyhow::Result;
use async_trait::async_trait;

use lootdrop_common::{Promotion, Storefront};

/// A storefront's catalog of currently-free promotions.
///
/// Errors never propagate past the scan's per-storefront isolation
/// boundary: the orchestrator treats `Err` and an empty listing the
/// same way (no data this run).
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    fn storefront(&self) -> Storefront;

    /// Fetch and normalize the storefront's current free promotions.
    async fn fetch(&self) -> Result<Vec<Promotion>>;
}
