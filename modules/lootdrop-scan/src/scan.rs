use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lootdrop_catalog::CatalogAdapter;
use lootdrop_common::{GuildConfig, LootdropError, Promotion, Storefront};
use lootdrop_store::{ConfigStore, LedgerStore};

use crate::ledger::AnnouncementLedger;
use crate::notify::Notifier;
use crate::render;
use crate::router::route;

/// Concurrent catalog fetches per scan.
const FETCH_CONCURRENCY: usize = 4;

/// Counters from one scan, for the run-complete log line. Purely
/// observational; nothing branches on them.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub storefronts_fetched: u32,
    pub storefronts_empty: u32,
    pub storefronts_failed: u32,
    pub promotions_discovered: u32,
    pub already_announced: u32,
    pub announcements_sent: u32,
    pub deliveries_failed: u32,
    pub guilds_scanned: u32,
    pub guilds_disabled: u32,
    /// Newly-announced promotions per guild.
    pub fresh_by_guild: HashMap<String, u32>,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scan Complete ===")?;
        writeln!(f, "Storefronts fetched: {}", self.storefronts_fetched)?;
        writeln!(f, "Storefronts empty:   {}", self.storefronts_empty)?;
        writeln!(f, "Storefronts failed:  {}", self.storefronts_failed)?;
        writeln!(f, "Promotions found:    {}", self.promotions_discovered)?;
        writeln!(f, "Already announced:   {}", self.already_announced)?;
        writeln!(f, "Announcements sent:  {}", self.announcements_sent)?;
        writeln!(f, "Deliveries failed:   {}", self.deliveries_failed)?;
        writeln!(
            f,
            "Guilds scanned:      {} ({} disabled)",
            self.guilds_scanned, self.guilds_disabled
        )?;
        if !self.fresh_by_guild.is_empty() {
            writeln!(f, "\nFresh per guild:")?;
            let mut rows: Vec<_> = self.fresh_by_guild.iter().collect();
            rows.sort();
            for (guild, count) in rows {
                writeln!(f, "  {guild}: {count}")?;
            }
        }
        Ok(())
    }
}

impl ScanStats {
    /// One-line summary for follow-up messages to the operator who
    /// asked for a manual scan.
    pub fn summary(&self) -> String {
        format!(
            "{} promotion(s) found, {} new announcement(s) sent, {} already announced",
            self.promotions_discovered, self.announcements_sent, self.already_announced
        )
    }
}

/// The scan orchestrator. Holds every collaborator behind its trait
/// seam; one instance serves the scheduler, the manual command, and
/// the admin trigger alike.
pub struct Scanner {
    adapters: HashMap<Storefront, Arc<dyn CatalogAdapter>>,
    configs: Arc<dyn ConfigStore>,
    ledger_store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl Scanner {
    pub fn new(
        adapters: HashMap<Storefront, Arc<dyn CatalogAdapter>>,
        configs: Arc<dyn ConfigStore>,
        ledger_store: Arc<dyn LedgerStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            adapters,
            configs,
            ledger_store,
            notifier,
        }
    }

    /// Read-only probe of the scan lock, for trigger surfaces that
    /// report a conflict instead of spawning.
    pub async fn is_running(&self) -> anyhow::Result<bool> {
        self.ledger_store.is_scan_locked().await
    }

    /// Run one full scan under the caller's run id; the id tags every
    /// log line of the run, so an id handed out in an acknowledgment
    /// can be found in the scan's own logs. Exclusive: returns
    /// `ScanLockHeld` when another scan is in flight, so two scans
    /// never interleave their single-blob ledger writes.
    pub async fn run(&self, scan_id: Uuid) -> Result<ScanStats, LootdropError> {
        if !self
            .ledger_store
            .try_acquire_scan_lock()
            .await
            .context("Failed to check scan lock")?
        {
            return Err(LootdropError::ScanLockHeld);
        }

        let result = self.run_inner(scan_id).await;

        // Always release, even when the run errored out.
        if let Err(e) = self.ledger_store.release_scan_lock().await {
            error!(error = %e, "Failed to release scan lock");
        }

        result.map_err(LootdropError::from)
    }

    async fn run_inner(&self, scan_id: Uuid) -> anyhow::Result<ScanStats> {
        info!(scan_id = %scan_id, "Scan starting");

        let mut stats = ScanStats::default();
        let mut ledger = AnnouncementLedger::load(self.ledger_store.as_ref()).await;

        let all_configs = self
            .configs
            .list_all()
            .await
            .context("Failed to list guild configs")?;

        let guilds: Vec<GuildConfig> = all_configs
            .into_iter()
            .filter(|config| {
                if !config.enabled {
                    stats.guilds_disabled += 1;
                }
                config.enabled
            })
            .collect();

        let catalogs = self.fetch_catalogs(&guilds, &mut stats).await;
        stats.promotions_discovered = catalogs.values().map(|p| p.len() as u32).sum();

        for config in &guilds {
            stats.guilds_scanned += 1;
            for &storefront in &config.watched {
                let Some(promotions) = catalogs.get(&storefront) else {
                    continue;
                };
                self.announce_for_guild(config, storefront, promotions, &mut ledger, &mut stats)
                    .await;
            }
        }

        // Single write at the end; in-memory decisions already drove
        // this scan, so a failed persist only risks re-announcing.
        if let Err(e) = ledger.persist(self.ledger_store.as_ref()).await {
            error!(error = %e, "Ledger persist failed; next scan may re-announce this batch");
        }

        info!(scan_id = %scan_id, "{stats}");
        Ok(stats)
    }

    /// Fetch each watched storefront's catalog once per scan, across
    /// the union of every enabled guild's watch set. A failed or empty
    /// fetch means that storefront contributes nothing this run.
    async fn fetch_catalogs(
        &self,
        guilds: &[GuildConfig],
        stats: &mut ScanStats,
    ) -> HashMap<Storefront, Vec<Promotion>> {
        let watched: BTreeSet<Storefront> = guilds
            .iter()
            .flat_map(|config| config.watched.iter().copied())
            .collect();

        let fetches: Vec<(Storefront, anyhow::Result<Vec<Promotion>>)> =
            stream::iter(watched.into_iter().filter_map(|storefront| {
                let adapter = self.adapters.get(&storefront)?.clone();
                Some(async move { (storefront, adapter.fetch().await) })
            }))
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut catalogs = HashMap::new();
        for (storefront, result) in fetches {
            match result {
                Ok(promotions) if promotions.is_empty() => {
                    debug!(storefront = %storefront, "No current promotions");
                    stats.storefronts_empty += 1;
                }
                Ok(promotions) => {
                    info!(storefront = %storefront, count = promotions.len(), "Catalog fetched");
                    stats.storefronts_fetched += 1;
                    catalogs.insert(storefront, promotions);
                }
                Err(e) => {
                    warn!(storefront = %storefront, error = %e, "Catalog fetch failed, treating as no data");
                    stats.storefronts_failed += 1;
                }
            }
        }
        catalogs
    }

    async fn announce_for_guild(
        &self,
        config: &GuildConfig,
        storefront: Storefront,
        promotions: &[Promotion],
        ledger: &mut AnnouncementLedger,
        stats: &mut ScanStats,
    ) {
        for promotion in promotions {
            let identity = promotion.identity();
            if ledger.contains(&identity) {
                stats.already_announced += 1;
                continue;
            }

            let destination = route(config, storefront);
            let message = render::announcement(promotion, config.locale);
            let mention = render::mention_preamble(&config.mention_roles);

            let delivered = self
                .notifier
                .deliver(destination, &message, mention.as_deref())
                .await;

            if delivered {
                stats.announcements_sent += 1;
                *stats
                    .fresh_by_guild
                    .entry(config.guild_id.clone())
                    .or_insert(0) += 1;
            } else {
                stats.deliveries_failed += 1;
                warn!(
                    guild = config.guild_id.as_str(),
                    destination,
                    identity = identity.as_str(),
                    "Delivery failed; promotion stays recorded and will not be retried"
                );
            }

            // record-despite-failure: the identity is marked seen even
            // when this delivery failed. A permanently-broken
            // destination must not turn every future scan into a retry
            // storm; the accepted cost is that a transient failure
            // becomes a silent miss.
            ledger.record(&identity);
        }
    }
}
