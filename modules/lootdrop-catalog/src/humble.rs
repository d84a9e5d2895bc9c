use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lootdrop_common::{Promotion, Storefront};

use crate::adapter::CatalogAdapter;

const SEARCH_URL: &str = "https://www.humblebundle.com/store/api/search";

pub struct HumbleAdapter {
    client: reqwest::Client,
}

impl HumbleAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogAdapter for HumbleAdapter {
    fn storefront(&self) -> Storefront {
        Storefront::Humble
    }

    async fn fetch(&self) -> Result<Vec<Promotion>> {
        let payload: SearchResults = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("sort", "discount"),
                ("filter", "onsale"),
                ("request", "1"),
            ])
            .send()
            .await
            .context("Humble search request failed")?
            .error_for_status()
            .context("Humble search returned non-success")?
            .json()
            .await
            .context("Humble search payload did not parse")?;

        Ok(parse_catalog(payload))
    }
}

/// On-sale items whose current price dropped to zero from a positive
/// full price. The positive-full-price guard keeps demo/freeware rows
/// that sometimes appear in the sale listing out.
fn parse_catalog(payload: SearchResults) -> Vec<Promotion> {
    payload
        .results
        .into_iter()
        .filter(|result| {
            result.current_price.as_ref().is_some_and(|p| p.amount == 0.0)
                && result.full_price.as_ref().is_some_and(|p| p.amount > 0.0)
        })
        .map(|result| Promotion {
            storefront: Storefront::Humble,
            native_id: result.machine_name,
            title: result.human_name,
            description: String::new(),
            url: format!(
                "https://www.humblebundle.com/store/{}",
                result.human_url
            ),
            image_url: result.standard_carousel_image,
            starts_at: None,
            ends_at: result
                .sale_end
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            original_price: result
                .full_price
                .map(|p| format!("${:.2}", p.amount)),
            rating: None,
        })
        .collect()
}

// --- Vendor payload ---

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    machine_name: String,
    human_name: String,
    /// Store-relative slug, e.g. "ghostlight-manor".
    human_url: String,
    standard_carousel_image: Option<String>,
    current_price: Option<PriceTag>,
    full_price: Option<PriceTag>,
    sale_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PriceTag {
    amount: f64,
}
