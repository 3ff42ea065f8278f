//! Liveness evaluation — turns raw store records into a connection verdict.
//!
//! Pure function of (snapshot, threshold, now). Keeping it free of clock
//! reads and side effects is what makes the registry testable without
//! real timers.

use chrono::{DateTime, Duration, Utc};

use super::store::ClientRecord;

/// Per-client verdict.
#[derive(Debug, Clone)]
pub struct ClientLiveness {
    pub client_id: String,
    pub seconds_since_heartbeat: i64,
    pub live: bool,
}

/// Aggregate verdict over a store snapshot.
#[derive(Debug, Clone)]
pub struct LivenessReport {
    pub connected: bool,
    pub active_clients: usize,
    pub per_client: Vec<ClientLiveness>,
}

/// Evaluate every record against the staleness threshold.
///
/// A record is live while `now - last_heartbeat < stale_after`. A record
/// stamped ahead of `now` counts as live with its age clamped to zero.
pub fn evaluate(records: &[ClientRecord], stale_after: Duration, now: DateTime<Utc>) -> LivenessReport {
    let per_client: Vec<ClientLiveness> = records
        .iter()
        .map(|record| {
            let gap = now - record.last_heartbeat;
            ClientLiveness {
                client_id: record.client_id.clone(),
                seconds_since_heartbeat: gap.num_seconds().max(0),
                live: gap < stale_after,
            }
        })
        .collect();

    let active_clients = per_client.iter().filter(|c| c.live).count();

    LivenessReport {
        connected: active_clients > 0,
        active_clients,
        per_client,
    }
}
