use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lootdrop_common::{Promotion, Storefront};

use crate::adapter::CatalogAdapter;

const FEATURED_URL: &str = "https://store.steampowered.com/api/featuredcategories";

pub struct SteamAdapter {
    client: reqwest::Client,
}

impl SteamAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogAdapter for SteamAdapter {
    fn storefront(&self) -> Storefront {
        Storefront::Steam
    }

    async fn fetch(&self) -> Result<Vec<Promotion>> {
        let payload: FeaturedCategories = self
            .client
            .get(FEATURED_URL)
            .query(&[("cc", "US"), ("l", "english")])
            .send()
            .await
            .context("Steam featured request failed")?
            .error_for_status()
            .context("Steam featured returned non-success")?
            .json()
            .await
            .context("Steam featured payload did not parse")?;

        Ok(parse_catalog(payload))
    }
}

/// A special is a freebie only at a full 100% discount; Steam keeps
/// permanently-free titles out of the specials bucket, so no extra
/// free-to-play filtering is needed.
fn parse_catalog(payload: FeaturedCategories) -> Vec<Promotion> {
    let Some(specials) = payload.specials else {
        return Vec::new();
    };

    specials
        .items
        .into_iter()
        .filter(|item| item.discounted && item.discount_percent == 100)
        .map(|item| Promotion {
            storefront: Storefront::Steam,
            native_id: item.id.to_string(),
            url: format!("https://store.steampowered.com/app/{}", item.id),
            title: item.name,
            description: String::new(),
            image_url: item.large_capsule_image,
            starts_at: None,
            ends_at: item
                .discount_expiration
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            original_price: item
                .original_price
                .map(|cents| format_price(cents, item.currency.as_deref())),
            rating: None,
        })
        .collect()
}

/// Steam reports prices in integer cents of the storefront currency.
fn format_price(cents: i64, currency: Option<&str>) -> String {
    let amount = cents as f64 / 100.0;
    match currency {
        Some("USD") | None => format!("${amount:.2}"),
        Some(code) => format!("{amount:.2} {code}"),
    }
}

// --- Vendor payload ---

#[derive(Debug, Deserialize)]
struct FeaturedCategories {
    specials: Option<Specials>,
}

#[derive(Debug, Deserialize)]
struct Specials {
    #[serde(default)]
    items: Vec<SpecialItem>,
}

#[derive(Debug, Deserialize)]
struct SpecialItem {
    id: i64,
    name: String,
    #[serde(default)]
    discounted: bool,
    #[serde(default)]
    discount_percent: u32,
    original_price: Option<i64>,
    currency: Option<String>,
    large_capsule_image: Option<String>,
    discount_expiration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "specials": {
            "id": "cat_specials",
            "name": "Specials",
            "items": [
                {
                    "id": 440660,
                    "name": "Starlit Forge",
                    "discounted": true,
                    "discount_percent": 100,
                    "original_price": 1499,
                    "final_price": 0,
                    "currency": "USD",
                    "large_capsule_image": "https://cdn.example/starlit.jpg",
                    "discount_expiration": 1785600000
                },
                {
                    "id": 550330,
                    "name": "Mostly Off Game",
                    "discounted": true,
                    "discount_percent": 90,
                    "original_price": 5999,
                    "final_price": 599,
                    "currency": "USD"
                },
                {
                    "id": 660220,
                    "name": "Regular Priced",
                    "discounted": false,
                    "discount_percent": 0
                }
            ]
        },
        "status": 1
    }"#;

    #[test]
    fn keeps_only_full_discounts() {
        let payload: FeaturedCategories = serde_json::from_str(FIXTURE).unwrap();
        let promotions = parse_catalog(payload);

        assert_eq!(promotions.len(), 1);
        let p = &promotions[0];
        assert_eq!(p.identity(), "steam:440660");
        assert_eq!(p.url, "https://store.steampowered.com/app/440660");
        assert_eq!(p.original_price.as_deref(), Some("$14.99"));
        assert!(p.ends_at.is_some());
    }

    #[test]
    fn missing_specials_bucket_is_empty_not_error() {
        let payload: FeaturedCategories = serde_json::from_str(r#"{"status": 1}"#).unwrap();
        assert!(parse_catalog(payload).is_empty());
    }

    #[test]
    fn non_usd_prices_keep_their_currency_code() {
        assert_eq!(format_price(1999, Some("EUR")), "19.99 EUR");
        assert_eq!(format_price(1999, None), "$19.99");
    }
}
