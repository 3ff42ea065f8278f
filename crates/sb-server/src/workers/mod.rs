//! Background workers — periodic tasks running alongside the server.

pub mod keepalive_extender;
pub mod stale_sweeper;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::AppState;

/// Start the background worker tasks. Returns handles so the binary can
/// abort them on shutdown instead of leaking timers.
pub fn start_all(state: Arc<AppState>) -> Vec<JoinHandle<()>> {
    let mut handles = vec![keepalive_extender::start(state.clone())];
    if state.config.sync.evict_after_secs.is_some() {
        handles.push(stale_sweeper::start(state));
    }
    handles
}
