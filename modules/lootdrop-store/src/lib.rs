// Persistence for lootdrop: guild configuration records and the
// announcement ledger blob, behind traits so the scan engine tests
// run with in-memory doubles. No network, no database, no Docker.

pub mod config_store;
pub mod ledger_store;
pub mod migrate;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use config_store::{ConfigStore, PgConfigStore};
pub use ledger_store::{LedgerStore, PgLedgerStore, LEDGER_KEY};
pub use migrate::migrate;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{MemoryConfigStore, MemoryLedgerStore};
