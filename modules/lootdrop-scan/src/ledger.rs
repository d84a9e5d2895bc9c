use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::warn;

use lootdrop_store::{LedgerStore, LEDGER_KEY};

/// How many announced identities the persisted ledger keeps. Oldest
/// entries fall off first; an identity's position is fixed when first
/// recorded and never refreshed, so eviction is strict FIFO.
pub const RETENTION: usize = 500;

/// The dedup ledger for one scan: an immutable snapshot of previously
/// announced identities plus a buffer of identities recorded during
/// this scan.
///
/// Membership checks consult the snapshot only. That makes the read
/// phase consistent across the whole scan: a promotion that is fresh
/// at load time stays fresh for every guild in this scan, and is still
/// recorded exactly once.
pub struct AnnouncementLedger {
    seen: Vec<String>,
    seen_index: HashSet<String>,
    fresh: Vec<String>,
    fresh_index: HashSet<String>,
}

impl AnnouncementLedger {
    pub fn empty() -> Self {
        Self {
            seen: Vec::new(),
            seen_index: HashSet::new(),
            fresh: Vec::new(),
            fresh_index: HashSet::new(),
        }
    }

    fn from_entries(seen: Vec<String>) -> Self {
        let seen_index = seen.iter().cloned().collect();
        Self {
            seen,
            seen_index,
            fresh: Vec::new(),
            fresh_index: HashSet::new(),
        }
    }

    /// Load the persisted ledger. Fails soft: a read error or a
    /// malformed blob degrades to an empty ledger, so this scan treats
    /// every promotion as new. Over-announcing beats going silent.
    pub async fn load(store: &dyn LedgerStore) -> Self {
        match store.get(LEDGER_KEY).await {
            Ok(Some(blob)) => match serde_json::from_slice::<Vec<String>>(&blob) {
                Ok(entries) => Self::from_entries(entries),
                Err(e) => {
                    warn!(error = %e, "Ledger blob malformed, starting from an empty ledger");
                    Self::empty()
                }
            },
            Ok(None) => Self::empty(),
            Err(e) => {
                warn!(error = %e, "Ledger load failed, treating all promotions as new");
                Self::empty()
            }
        }
    }

    /// Was this identity already announced before this scan started?
    /// Identities recorded during the current scan are NOT visible.
    pub fn contains(&self, identity: &str) -> bool {
        self.seen_index.contains(identity)
    }

    /// Buffer an identity for the end-of-scan persist. Idempotent
    /// within a scan and against the snapshot.
    pub fn record(&mut self, identity: &str) {
        if self.seen_index.contains(identity) {
            return;
        }
        if self.fresh_index.insert(identity.to_string()) {
            self.fresh.push(identity.to_string());
        }
    }

    /// Identities recorded during this scan.
    pub fn fresh_count(&self) -> usize {
        self.fresh.len()
    }

    /// Write the ledger back as one blob, truncated to the newest
    /// `RETENTION` entries. Skips the write entirely when nothing was
    /// recorded this scan.
    pub async fn persist(&self, store: &dyn LedgerStore) -> Result<()> {
        if self.fresh.is_empty() {
            return Ok(());
        }

        let total = self.seen.len() + self.fresh.len();
        let entries: Vec<&String> = self
            .seen
            .iter()
            .chain(self.fresh.iter())
            .skip(total.saturating_sub(RETENTION))
            .collect();

        let blob = serde_json::to_vec(&entries).context("Failed to serialize ledger")?;
        store
            .put(LEDGER_KEY, &blob)
            .await
            .context("Failed to persist ledger")
    }
}
