//! In-memory store of per-client registration and heartbeat state.
//!
//! Holds the latest known record per client identifier and nothing else —
//! no time-based logic lives here. Staleness is a read-time computation in
//! `liveness`; the store never holds a "disconnected" record.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Connection tag on a stored record. A record only exists while its agent
/// is considered registered, so the tag has a single variant; disconnection
/// is derived from heartbeat age, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Connected,
}

/// Descriptive metadata carried for diagnostics; not used in liveness logic.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub company_name: Option<String>,
    pub version: Option<String>,
    pub ip_address: Option<String>,
}

/// Last-known state for one registered agent identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub client_id: String,
    pub last_heartbeat: DateTime<Utc>,
    pub status: ClientStatus,
    pub company_name: Option<String>,
    pub version: Option<String>,
    pub ip_address: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Map of client id → latest record, guarded by a single mutex.
///
/// The workload is a heartbeat every ~30s per client plus one extender tick
/// every 30s, so one lock covering every mutation and snapshot read is all
/// the coordination this needs.
#[derive(Debug, Default)]
pub struct ClientStore {
    records: Mutex<HashMap<String, ClientRecord>>,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock still holds whole-record writes, so recover the
    // guard rather than propagate a panic into heartbeat handling.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, ClientRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or refresh the record for `client_id`, stamping `now`.
    ///
    /// Metadata fields follow last-write-wins per field: absent incoming
    /// fields keep whatever an earlier registration supplied, so a bare
    /// re-register never erases diagnostics.
    pub fn upsert(&self, client_id: &str, meta: ClientMetadata, now: DateTime<Utc>) {
        let mut records = self.lock();
        match records.get_mut(client_id) {
            Some(record) => {
                record.last_heartbeat = now;
                if meta.company_name.is_some() {
                    record.company_name = meta.company_name;
                }
                if meta.version.is_some() {
                    record.version = meta.version;
                }
                if meta.ip_address.is_some() {
                    record.ip_address = meta.ip_address;
                }
            }
            None => {
                records.insert(client_id.to_string(), new_record(client_id, meta, now));
            }
        }
    }

    /// Heartbeat path: refresh `last_heartbeat` only, creating a record
    /// with defaulted metadata for an unseen id.
    pub fn touch(&self, client_id: &str, now: DateTime<Utc>) {
        let mut records = self.lock();
        match records.get_mut(client_id) {
            Some(record) => record.last_heartbeat = now,
            None => {
                records.insert(
                    client_id.to_string(),
                    new_record(client_id, ClientMetadata::default(), now),
                );
            }
        }
    }

    /// Synthetic refresh applied by the keep-alive extender. Never moves
    /// `last_heartbeat` backward; returns whether the refresh was applied.
    pub fn extend(&self, client_id: &str, now: DateTime<Utc>) -> bool {
        let mut records = self.lock();
        match records.get_mut(client_id) {
            Some(record) if now > record.last_heartbeat => {
                record.last_heartbeat = now;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, client_id: &str) -> Option<ClientRecord> {
        self.lock().get(client_id).cloned()
    }

    /// Owned copy of every record at call time. Mutations made after the
    /// lock is released are not visible through the snapshot.
    pub fn snapshot(&self) -> Vec<ClientRecord> {
        self.lock().values().cloned().collect()
    }

    /// Drop records whose last heartbeat predates `cutoff`; returns the
    /// evicted ids.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let mut records = self.lock();
        let expired: Vec<String> = records
            .iter()
            .filter(|(_, record)| record.last_heartbeat < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            records.remove(id);
        }
        expired
    }
}

fn new_record(client_id: &str, meta: ClientMetadata, now: DateTime<Utc>) -> ClientRecord {
    ClientRecord {
        client_id: client_id.to_string(),
        last_heartbeat: now,
        status: ClientStatus::Connected,
        company_name: meta.company_name,
        version: meta.version,
        ip_address: meta.ip_address,
        registered_at: now,
    }
}
