//! Sync bridge registry — tracks which on-prem agents are reachable.
//!
//! Agents announce themselves with `register`, then prove liveness with
//! periodic `heartbeat` calls. Any number of API callers can ask for the
//! aggregate connection status; a background keep-alive tick masks short
//! heartbeat gaps from the most recently active client so that agent-side
//! scheduling jitter does not flap the reported status.

pub mod clock;
pub mod liveness;
pub mod store;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use self::clock::Clock;
use self::liveness::{evaluate, LivenessReport};
use self::store::{ClientMetadata, ClientRecord, ClientStore};
use sb_common::SyncConfig;

/// Identity assumed for agents that never send a `clientId`. Advisory
/// only — identity is not security-relevant here.
pub const DEFAULT_CLIENT_ID: &str = "desktop-agent";

/// Prefix of the opaque key echoed back on registration. Identification,
/// not a credential.
pub const API_KEY_PREFIX: &str = "sbk-";

/// Outcome of a registration call.
#[derive(Debug, Clone)]
pub struct Registration {
    pub client_id: String,
    pub api_key: String,
}

/// Aggregate view returned by `status()`.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub connected: bool,
    pub active_clients: usize,
    pub per_client: Vec<liveness::ClientLiveness>,
    /// Set the first time the registry is ever observed connected; sticky
    /// across later disconnects for the life of the process.
    pub last_sync: Option<DateTime<Utc>>,
}

/// Registry façade owning the client store, the clock, and the thresholds.
/// Constructed once at startup and shared with handlers and workers.
pub struct SyncRegistry {
    store: ClientStore,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    extend_after: Duration,
    evict_after: Option<Duration>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl SyncRegistry {
    pub fn new(clock: Arc<dyn Clock>, cfg: &SyncConfig) -> Self {
        Self {
            store: ClientStore::new(),
            clock,
            stale_after: Duration::seconds(cfg.stale_after_secs as i64),
            extend_after: Duration::seconds(cfg.extend_after_secs as i64),
            evict_after: cfg
                .evict_after_secs
                .map(|secs| Duration::seconds(secs as i64)),
            last_sync: Mutex::new(None),
        }
    }

    /// Create or refresh a client record. Always succeeds; a missing or
    /// blank id falls back to [`DEFAULT_CLIENT_ID`].
    pub fn register(&self, client_id: Option<String>, meta: ClientMetadata) -> Registration {
        let client_id = resolve_client_id(client_id);
        self.store.upsert(&client_id, meta, self.clock.now());
        tracing::info!(%client_id, "sync client registered");

        let api_key = format!("{API_KEY_PREFIX}{client_id}");
        Registration { client_id, api_key }
    }

    /// Refresh `last_heartbeat` for the given client, creating the record
    /// if needed. Idempotent. Returns the server's current timestamp so
    /// agents can detect clock drift.
    pub fn heartbeat(&self, client_id: Option<String>) -> DateTime<Utc> {
        let client_id = resolve_client_id(client_id);
        let now = self.clock.now();
        self.store.touch(&client_id, now);
        tracing::debug!(%client_id, "heartbeat received");
        now
    }

    /// Evaluate liveness over a fresh snapshot and maintain the sticky
    /// `last_sync` marker.
    pub fn status(&self) -> SyncStatus {
        let now = self.clock.now();
        let report = self.evaluate_at(now);

        let mut last_sync = self
            .last_sync
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if report.connected && last_sync.is_none() {
            *last_sync = Some(now);
        }

        SyncStatus {
            connected: report.connected,
            active_clients: report.active_clients,
            per_client: report.per_client,
            last_sync: *last_sync,
        }
    }

    /// Raw snapshot for diagnostic listing, unfiltered by liveness.
    pub fn clients(&self) -> Vec<ClientRecord> {
        self.store.snapshot()
    }

    /// One keep-alive tick: if the freshest client's heartbeat gap has
    /// crossed the extension threshold (but only then), rewrite its
    /// `last_heartbeat` to now. At most one client is extended per tick —
    /// the point is to mask a missed heartbeat from an agent that is still
    /// fundamentally connected, not to manufacture liveness.
    ///
    /// Returns the extended client id, if any. Must never panic: the
    /// background worker relies on every tick running.
    pub fn extend_keepalive(&self) -> Option<String> {
        let snapshot = self.store.snapshot();
        // Ties broken deterministically: first encountered wins.
        let freshest = snapshot
            .iter()
            .reduce(|best, record| {
                if record.last_heartbeat > best.last_heartbeat {
                    record
                } else {
                    best
                }
            })?;

        let now = self.clock.now();
        let gap = now - freshest.last_heartbeat;
        if gap <= self.extend_after {
            return None;
        }

        if self.store.extend(&freshest.client_id, now) {
            Some(freshest.client_id.clone())
        } else {
            None
        }
    }

    /// Evict records stale beyond the configured eviction window. A no-op
    /// unless `sync.evict_after_secs` is set.
    pub fn sweep_expired(&self) -> Vec<String> {
        match self.evict_after {
            Some(evict_after) => self.store.evict_older_than(self.clock.now() - evict_after),
            None => Vec::new(),
        }
    }

    fn evaluate_at(&self, now: DateTime<Utc>) -> LivenessReport {
        evaluate(&self.store.snapshot(), self.stale_after, now)
    }
}

fn resolve_client_id(client_id: Option<String>) -> String {
    client_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string())
}
