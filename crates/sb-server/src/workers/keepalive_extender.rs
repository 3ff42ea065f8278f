//! Keep-alive extender — masks short heartbeat gaps from the freshest client.
//!
//! Runs on a fixed tick (default every 30 seconds). When the most recently
//! active client's heartbeat gap has crossed the extension threshold but the
//! record has not yet been reported stale, its `last_heartbeat` is rewritten
//! to now, buying one tick of grace before the staleness cutoff.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::AppState;

pub fn start(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            state.config.sync.tick_secs,
        ));

        tracing::info!(
            "Keep-alive extender started (every {}s, extend after {}s, stale after {}s)",
            state.config.sync.tick_secs,
            state.config.sync.extend_after_secs,
            state.config.sync.stale_after_secs
        );

        loop {
            interval.tick().await;

            // A tick must never take the loop down with it.
            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                state.registry.extend_keepalive()
            })) {
                Ok(Some(client_id)) => {
                    tracing::info!(%client_id, "keep-alive extension applied");
                }
                Ok(None) => {}
                Err(_) => {
                    tracing::error!("keep-alive tick panicked; skipping this tick");
                }
            }
        }
    })
}
