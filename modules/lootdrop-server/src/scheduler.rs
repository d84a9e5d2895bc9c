use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use uuid::Uuid;

use lootdrop_common::LootdropError;
use lootdrop_scan::Scanner;

/// Start the recurring scan loop as a background task. Runs forever;
/// a failed scan is logged and the loop keeps its cadence.
pub fn start_scan_interval(scanner: Arc<Scanner>, interval_minutes: u64) {
    info!(interval_minutes, "Starting scan interval loop");

    tokio::spawn(async move {
        loop {
            let scan_id = Uuid::new_v4();
            match scanner.run(scan_id).await {
                Ok(stats) => info!(scan_id = %scan_id, "Scheduled scan complete. {stats}"),
                // A manual scan is in flight; its results cover this tick.
                Err(LootdropError::ScanLockHeld) => {
                    info!("Scheduled scan skipped, another scan is running")
                }
                Err(e) => error!(scan_id = %scan_id, error = %e, "Scheduled scan failed"),
            }

            tokio::time::sleep(Duration::from_secs(interval_minutes * 60)).await;
        }
    });
}
