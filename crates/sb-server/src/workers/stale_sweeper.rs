//! Stale sweeper — evicts records from long-dead agents.
//!
//! Only started when `sync.evict_after_secs` is configured. Runs every 60
//! seconds and drops records whose heartbeat gap exceeds the eviction
//! window. Eviction is diagnostics hygiene: liveness reporting is already
//! correct without it, since staleness is computed on read.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::AppState;

const CHECK_INTERVAL_SECS: u64 = 60;

pub fn start(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(tokio::time::Duration::from_secs(CHECK_INTERVAL_SECS));

        let evict_after_secs = state.config.sync.evict_after_secs.unwrap_or_default();
        tracing::info!(
            "Stale sweeper started (every {}s, evict after {}s)",
            CHECK_INTERVAL_SECS,
            evict_after_secs
        );

        loop {
            interval.tick().await;

            let evicted = state.registry.sweep_expired();
            if !evicted.is_empty() {
                tracing::info!(count = evicted.len(), ids = ?evicted, "stale client records evicted");
            }
        }
    })
}
