use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Storefronts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storefront {
    Epic,
    Steam,
    Gog,
    Humble,
}

impl Storefront {
    pub const ALL: [Storefront; 4] = [
        Storefront::Epic,
        Storefront::Steam,
        Storefront::Gog,
        Storefront::Humble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Storefront::Epic => "epic",
            Storefront::Steam => "steam",
            Storefront::Gog => "gog",
            Storefront::Humble => "humble",
        }
    }

    /// Human-facing storefront name, used in announcement embeds.
    pub fn display_name(&self) -> &'static str {
        match self {
            Storefront::Epic => "Epic Games Store",
            Storefront::Steam => "Steam",
            Storefront::Gog => "GOG",
            Storefront::Humble => "Humble Store",
        }
    }
}

impl std::fmt::Display for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Storefront {
    type Err = crate::LootdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epic" => Ok(Storefront::Epic),
            "steam" => Ok(Storefront::Steam),
            "gog" => Ok(Storefront::Gog),
            "humble" => Ok(Storefront::Humble),
            other => Err(crate::LootdropError::UnknownStorefront(other.to_string())),
        }
    }
}

// --- Locales ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    De,
    Fr,
    Es,
    It,
    Pl,
    PtBr,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 8] = [
        Locale::En,
        Locale::De,
        Locale::Fr,
        Locale::Es,
        Locale::It,
        Locale::Pl,
        Locale::PtBr,
        Locale::Ru,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
            Locale::Fr => "fr",
            Locale::Es => "es",
            Locale::It => "it",
            Locale::Pl => "pl",
            Locale::PtBr => "pt-BR",
            Locale::Ru => "ru",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Locale {
    type Err = crate::LootdropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            "fr" => Ok(Locale::Fr),
            "es" => Ok(Locale::Es),
            "it" => Ok(Locale::It),
            "pl" => Ok(Locale::Pl),
            "pt-BR" => Ok(Locale::PtBr),
            "ru" => Ok(Locale::Ru),
            other => Err(crate::LootdropError::UnknownLocale(other.to_string())),
        }
    }
}

// --- Promotions ---

/// One storefront's time-bounded free-game offer. Built fresh on every
/// catalog fetch and never persisted; only `identity()` is.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub storefront: Storefront,
    /// Storefront-scoped identifier, stable across repeated fetches of
    /// the same offer.
    pub native_id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Display-formatted original price, e.g. "$19.99".
    pub original_price: Option<String>,
    /// Review score in [0, 100], where the storefront exposes one.
    pub rating: Option<f32>,
}

impl Promotion {
    /// The dedup key: globally unique, stable across fetches.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.storefront, self.native_id)
    }
}

// --- Guild configuration ---

/// Per-guild announcement configuration. Stored and mutated as a whole
/// record (last writer wins); mutations arrive one at a time through
/// the interaction front door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: String,
    pub enabled: bool,
    /// Primary announcement channel. Mandatory: the router's final
    /// fallback, so a promotion can never lack a destination.
    pub channel_id: String,
    /// Shared thread override for all storefronts.
    #[serde(default)]
    pub thread_id: Option<String>,
    pub watched: BTreeSet<Storefront>,
    /// Roles pinged on every announcement, in configured order.
    #[serde(default)]
    pub mention_roles: Vec<String>,
    #[serde(default)]
    pub per_storefront_threads: bool,
    /// Partial mapping, only consulted while `per_storefront_threads`
    /// is set. Absence of a watched storefront here is a normal state.
    #[serde(default)]
    pub storefront_threads: BTreeMap<Storefront, String>,
    #[serde(default)]
    pub locale: Locale,
}

impl GuildConfig {
    /// Fresh config: enabled, watching every storefront, announcing to
    /// `channel_id`, English, no threads, no mentions.
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            enabled: true,
            channel_id: channel_id.into(),
            thread_id: None,
            watched: Storefront::ALL.into_iter().collect(),
            mention_roles: Vec::new(),
            per_storefront_threads: false,
            storefront_threads: BTreeMap::new(),
            locale: Locale::default(),
        }
    }
}
