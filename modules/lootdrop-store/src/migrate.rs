use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

/// Create the schema if it does not exist. Safe to run on every start.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS guild_configs (
            guild_id   TEXT PRIMARY KEY,
            config     JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ledger_blobs (
            key        TEXT PRIMARY KEY,
            blob       BYTEA NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    // Single-row advisory lock table; `held` is the fixed key.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scan_lock (
            held       BOOLEAN PRIMARY KEY,
            started_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    info!("Schema migration complete");
    Ok(())
}
