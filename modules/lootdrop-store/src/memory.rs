// In-memory store doubles for deterministic engine tests, with fault
// injection for the fail-soft paths and a write counter for the
// skip-persist-if-clean assertion.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use lootdrop_common::GuildConfig;

use crate::config_store::ConfigStore;
use crate::ledger_store::LedgerStore;

#[derive(Default)]
pub struct MemoryConfigStore {
    records: Mutex<BTreeMap<String, GuildConfig>>,
    fail_list: AtomicBool,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(configs: impl IntoIterator<Item = GuildConfig>) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.lock().unwrap();
            for config in configs {
                records.insert(config.guild_id.clone(), config);
            }
        }
        store
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, guild_id: &str) -> Result<Option<GuildConfig>> {
        Ok(self.records.lock().unwrap().get(guild_id).cloned())
    }

    async fn put(&self, config: &GuildConfig) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(config.guild_id.clone(), config.clone());
        Ok(())
    }

    async fn delete(&self, guild_id: &str) -> Result<()> {
        self.records.lock().unwrap().remove(guild_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<GuildConfig>> {
        if self.fail_list.load(Ordering::Relaxed) {
            bail!("injected list failure");
        }
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    locked: AtomicBool,
    fail_get: AtomicBool,
    fail_put: AtomicBool,
    put_count: AtomicUsize,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::Relaxed);
    }

    /// Number of successful `put` calls observed.
    pub fn put_count(&self) -> usize {
        self.put_count.load(Ordering::Relaxed)
    }

    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_get.load(Ordering::Relaxed) {
            bail!("injected read failure");
        }
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        if self.fail_put.load(Ordering::Relaxed) {
            bail!("injected write failure");
        }
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), blob.to_vec());
        self.put_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn try_acquire_scan_lock(&self) -> Result<bool> {
        Ok(self
            .locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok())
    }

    async fn release_scan_lock(&self) -> Result<()> {
        self.locked.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_scan_locked(&self) -> Result<bool> {
        Ok(self.locked.load(Ordering::SeqCst))
    }
}
