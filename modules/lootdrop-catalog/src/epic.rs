use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lootdrop_common::{Promotion, Storefront};

use crate::adapter::CatalogAdapter;

const FREE_GAMES_URL: &str =
    "https://store-site-backend-static.ak.epicgames.com/freeGamesPromotions";

pub struct EpicAdapter {
    client: reqwest::Client,
}

impl EpicAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogAdapter for EpicAdapter {
    fn storefront(&self) -> Storefront {
        Storefront::Epic
    }

    async fn fetch(&self) -> Result<Vec<Promotion>> {
        let payload: FreeGamesResponse = self
            .client
            .get(FREE_GAMES_URL)
            .query(&[("locale", "en-US")])
            .send()
            .await
            .context("Epic free games request failed")?
            .error_for_status()
            .context("Epic free games returned non-success")?
            .json()
            .await
            .context("Epic free games payload did not parse")?;

        Ok(parse_catalog(payload))
    }
}

/// Keep the catalog elements that carry an active 100%-off promotional
/// offer. Upcoming offers and partial discounts are not freebies yet.
fn parse_catalog(payload: FreeGamesResponse) -> Vec<Promotion> {
    let elements = payload.data.catalog.search_store.elements;
    let mut promotions = Vec::new();

    for element in elements {
        let Some((starts_at, ends_at)) = element
            .active_free_offer()
            .map(|offer| (offer.start_date, offer.end_date))
        else {
            continue;
        };
        let Some(slug) = element.page_slug().map(str::to_owned) else {
            // Some catalog rows are bundles/editions without a product
            // page; nothing to link to, skip.
            tracing::debug!(title = element.title.as_str(), "Epic element without slug, skipping");
            continue;
        };

        let original_price = element
            .price
            .as_ref()
            .and_then(|p| p.total_price.fmt_price.as_ref())
            .map(|fmt| fmt.original_price.clone());

        let image_url = element
            .key_images
            .iter()
            .find(|img| img.image_type == "OfferImageWide")
            .or_else(|| element.key_images.first())
            .map(|img| img.url.clone());

        promotions.push(Promotion {
            storefront: Storefront::Epic,
            native_id: element.id,
            title: element.title,
            description: element.description.unwrap_or_default(),
            url: format!("https://store.epicgames.com/p/{slug}"),
            image_url,
            starts_at,
            ends_at,
            original_price,
            rating: None,
        });
    }

    promotions
}

// --- Vendor payload ---

#[derive(Debug, Deserialize)]
struct FreeGamesResponse {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(rename = "Catalog")]
    catalog: Catalog,
}

#[derive(Debug, Deserialize)]
struct Catalog {
    #[serde(rename = "searchStore")]
    search_store: SearchStore,
}

#[derive(Debug, Deserialize)]
struct SearchStore {
    elements: Vec<CatalogElement>,
}

#[derive(Debug, Deserialize)]
struct CatalogElement {
    id: String,
    title: String,
    description: Option<String>,
    #[serde(rename = "productSlug")]
    product_slug: Option<String>,
    #[serde(rename = "offerMappings", default)]
    offer_mappings: Vec<PageMapping>,
    #[serde(rename = "keyImages", default)]
    key_images: Vec<KeyImage>,
    price: Option<Price>,
    promotions: Option<Promotions>,
}

impl CatalogElement {
    /// The currently-running offer that makes this element free, if any.
    fn active_free_offer(&self) -> Option<&PromotionalOffer> {
        let promotions = self.promotions.as_ref()?;
        promotions
            .promotional_offers
            .iter()
            .flat_map(|group| &group.promotional_offers)
            .find(|offer| {
                offer
                    .discount_setting
                    .as_ref()
                    .is_some_and(|d| d.discount_percentage == Some(0))
            })
    }

    fn page_slug(&self) -> Option<&str> {
        self.offer_mappings
            .iter()
            .find(|m| m.page_type.as_deref() == Some("productHome"))
            .map(|m| m.page_slug.as_str())
            .or(self.product_slug.as_deref())
            .map(|s| s.trim_end_matches("/home"))
            .filter(|s| !s.is_empty() && *s != "[]")
    }
}

#[derive(Debug, Deserialize)]
struct PageMapping {
    #[serde(rename = "pageSlug")]
    page_slug: String,
    #[serde(rename = "pageType")]
    page_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyImage {
    #[serde(rename = "type")]
    image_type: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(rename = "totalPrice")]
    total_price: TotalPrice,
}

#[derive(Debug, Deserialize)]
struct TotalPrice {
    #[serde(rename = "fmtPrice")]
    fmt_price: Option<FmtPrice>,
}

#[derive(Debug, Deserialize)]
struct FmtPrice {
    #[serde(rename = "originalPrice")]
    original_price: String,
}

#[derive(Debug, Deserialize)]
struct Promotions {
    #[serde(rename = "promotionalOffers", default)]
    promotional_offers: Vec<OfferGroup>,
}

#[derive(Debug, Deserialize)]
struct OfferGroup {
    #[serde(rename = "promotionalOffers", default)]
    promotional_offers: Vec<PromotionalOffer>,
}

#[derive(Debug, Deserialize)]
struct PromotionalOffer {
    #[serde(rename = "startDate")]
    start_date: Option<DateTime<Utc>>,
    #[serde(rename = "endDate")]
    end_date: Option<DateTime<Utc>>,
    #[serde(rename = "discountSetting")]
    discount_setting: Option<DiscountSetting>,
}

#[derive(Debug, Deserialize)]
struct DiscountSetting {
    #[serde(rename = "discountPercentage")]
    discount_percentage: Option<u32>,
}
