use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use lootdrop_common::GuildConfig;

/// Whole-record storage for guild configurations. Reads and writes the
/// full document; there is no field-level mutation.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get(&self, guild_id: &str) -> Result<Option<GuildConfig>>;

    async fn put(&self, config: &GuildConfig) -> Result<()>;

    async fn delete(&self, guild_id: &str) -> Result<()>;

    /// All stored configurations, enabled or not. A full listing may
    /// lag individual writes; per-key reads are consistent.
    async fn list_all(&self) -> Result<Vec<GuildConfig>>;
}

pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn get(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        let row = sqlx::query("SELECT config FROM guild_configs WHERE guild_id = $1")
            .bind(guild_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read guild config")?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row.get("config");
                let config = serde_json::from_value(value)
                    .with_context(|| format!("Malformed config record for guild {guild_id}"))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, config: &GuildConfig) -> Result<()> {
        let value = serde_json::to_value(config).context("Failed to serialize guild config")?;
        sqlx::query(
            "INSERT INTO guild_configs (guild_id, config, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (guild_id) DO UPDATE SET config = $2, updated_at = now()",
        )
        .bind(&config.guild_id)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("Failed to write guild config")?;
        Ok(())
    }

    async fn delete(&self, guild_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM guild_configs WHERE guild_id = $1")
            .bind(guild_id)
            .execute(&self.pool)
            .await
            .context("Failed to delete guild config")?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<GuildConfig>> {
        let rows = sqlx::query("SELECT guild_id, config FROM guild_configs ORDER BY guild_id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list guild configs")?;

        let mut configs = Vec::with_capacity(rows.len());
        for row in rows {
            let guild_id: String = row.get("guild_id");
            let value: serde_json::Value = row.get("config");
            match serde_json::from_value(value) {
                Ok(config) => configs.push(config),
                // One bad record must not take down the whole listing.
                Err(e) => {
                    tracing::warn!(guild_id = guild_id.as_str(), error = %e, "Skipping malformed config record");
                }
            }
        }
        Ok(configs)
    }
}
