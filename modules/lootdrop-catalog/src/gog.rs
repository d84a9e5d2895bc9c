use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use lootdrop_common::{Promotion, Storefront};

use crate::adapter::CatalogAdapter;

const CATALOG_URL: &str = "https://embed.gog.com/games/ajax/filtered";

pub struct GogAdapter {
    client: reqwest::Client,
}

impl GogAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogAdapter for GogAdapter {
    fn storefront(&self) -> Storefront {
        Storefront::Gog
    }

    async fn fetch(&self) -> Result<Vec<Promotion>> {
        let payload: FilteredGames = self
            .client
            .get(CATALOG_URL)
            .query(&[("mediaType", "game"), ("price", "free"), ("sort", "popularity")])
            .send()
            .await
            .context("GOG catalog request failed")?
            .error_for_status()
            .context("GOG catalog returned non-success")?
            .json()
            .await
            .context("GOG catalog payload did not parse")?;

        Ok(parse_catalog(payload))
    }
}

/// The price=free filter also returns permanently-free titles; a
/// giveaway is the discounted subset that currently costs nothing.
fn parse_catalog(payload: FilteredGames) -> Vec<Promotion> {
    payload
        .products
        .into_iter()
        .filter(|product| {
            product.price.is_discounted
                && product.price.final_amount.parse::<f64>().unwrap_or(1.0) == 0.0
        })
        .map(|product| Promotion {
            storefront: Storefront::Gog,
            native_id: product.id.to_string(),
            title: product.title,
            description: String::new(),
            url: format!("https://www.gog.com{}", product.url),
            image_url: product
                .image
                .map(|path| format!("https:{path}.jpg")),
            starts_at: None,
            ends_at: None,
            original_price: Some(format!(
                "{}{}",
                product.price.symbol, product.price.base_amount
            )),
            rating: product.rating.map(|tenths| tenths as f32 * 2.0),
        })
        .collect()
}

// --- Vendor payload ---

#[derive(Debug, Deserialize)]
struct FilteredGames {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: i64,
    title: String,
    /// Store-relative page path, e.g. "/game/some_title".
    url: String,
    /// Protocol-relative image path without extension.
    image: Option<String>,
    price: ProductPrice,
    /// Review score in tenths out of 50 (e.g. 44 → 88/100).
    rating: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProductPrice {
    #[serde(rename = "baseAmount")]
    base_amount: String,
    #[serde(rename = "finalAmount")]
    final_amount: String,
    #[serde(rename = "isDiscounted")]
    is_discounted: bool,
    #[serde(default)]
    symbol: String,
}
