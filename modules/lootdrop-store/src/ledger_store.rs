use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// The single logical key the announcement ledger lives under.
pub const LEDGER_KEY: &str = "announced";

/// Blob storage for the announcement ledger, plus the advisory lock
/// that serializes scans. Lock and ledger share one store so the
/// single-blob write discipline cannot be split across databases.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, blob: &[u8]) -> Result<()>;

    /// Try to take the exclusive scan lock. Returns false when another
    /// scan holds it. Locks older than 30 minutes are treated as stale
    /// leftovers of a killed process and reaped.
    async fn try_acquire_scan_lock(&self) -> Result<bool>;

    async fn release_scan_lock(&self) -> Result<()>;

    /// Read-only probe of the scan lock, no acquire/release dance.
    /// Stale locks (>30 minutes) do not count as held.
    async fn is_scan_locked(&self) -> Result<bool>;
}

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT blob FROM ledger_blobs WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read ledger blob")?;
        Ok(row.map(|r| r.get("blob")))
    }

    async fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT INTO ledger_blobs (key, blob, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (key) DO UPDATE SET blob = $2, updated_at = now()",
        )
        .bind(key)
        .bind(blob)
        .execute(&self.pool)
        .await
        .context("Failed to write ledger blob")?;
        Ok(())
    }

    async fn try_acquire_scan_lock(&self) -> Result<bool> {
        // Reap stale locks from killed processes.
        sqlx::query("DELETE FROM scan_lock WHERE started_at < now() - interval '30 minutes'")
            .execute(&self.pool)
            .await
            .context("Failed to reap stale scan lock")?;

        // Atomic insert-if-absent; no check-then-create race.
        let result = sqlx::query(
            "INSERT INTO scan_lock (held, started_at) VALUES (TRUE, now())
             ON CONFLICT (held) DO NOTHING",
        )
        .execute(&self.pool)
        .await
        .context("Failed to acquire scan lock")?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_scan_lock(&self) -> Result<()> {
        sqlx::query("DELETE FROM scan_lock")
            .execute(&self.pool)
            .await
            .context("Failed to release scan lock")?;
        Ok(())
    }

    async fn is_scan_locked(&self) -> Result<bool> {
        let row = sqlx::query(
            "SELECT held FROM scan_lock WHERE started_at >= now() - interval '30 minutes'",
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to check scan lock")?;
        Ok(row.is_some())
    }
}
