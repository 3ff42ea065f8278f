//! Sync bridge API — agent registration, heartbeats, and status queries.
//!
//! Request bodies are parsed leniently: agent identity is advisory in this
//! layer, so a missing body, malformed JSON, or an ill-typed `clientId`
//! falls back to the default identity instead of rejecting the call.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::sync::store::{ClientMetadata, ClientRecord};
use crate::AppState;
use sb_common::{AppError, AppResult};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/heartbeat", post(heartbeat))
        .route("/sync/status", get(sync_status))
        .route("/clients", get(list_clients))
        .route("/test-connection", post(test_connection))
        .with_state(state)
}

// ─── Types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    success: bool,
    client_id: String,
    api_key: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatResponse {
    success: bool,
    message: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncStatusResponse {
    is_connected: bool,
    last_sync: Option<DateTime<Utc>>,
    connected_clients: usize,
    status: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestConnectionResponse {
    success: bool,
    message: String,
}

// ─── Handlers ────────────────────────────────────────────────

async fn register(State(state): State<Arc<AppState>>, body: Bytes) -> Json<RegisterResponse> {
    let fields = parse_body(&body);
    let meta = ClientMetadata {
        company_name: string_field(&fields, "companyName"),
        version: string_field(&fields, "version"),
        ip_address: string_field(&fields, "ipAddress"),
    };

    let outcome = state
        .registry
        .register(string_field(&fields, "clientId"), meta);

    Json(RegisterResponse {
        success: true,
        client_id: outcome.client_id,
        api_key: outcome.api_key,
        message: "client registered".into(),
    })
}

async fn heartbeat(State(state): State<Arc<AppState>>, body: Bytes) -> Json<HeartbeatResponse> {
    let fields = parse_body(&body);
    let timestamp = state.registry.heartbeat(string_field(&fields, "clientId"));

    Json(HeartbeatResponse {
        success: true,
        message: "heartbeat received".into(),
        timestamp,
    })
}

async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SyncStatusResponse> {
    let status = state.registry.status();

    let (label, message) = if status.connected {
        (
            "connected",
            format!("{} sync client(s) active", status.active_clients),
        )
    } else {
        ("disconnected", "no sync client has reported recently".into())
    };

    Json(SyncStatusResponse {
        is_connected: status.connected,
        last_sync: status.last_sync,
        connected_clients: status.active_clients,
        status: label.into(),
        message,
    })
}

async fn list_clients(State(state): State<Arc<AppState>>) -> Json<Vec<ClientRecord>> {
    Json(state.registry.clients())
}

async fn test_connection(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<TestConnectionResponse>> {
    let status = state.registry.status();
    if !status.connected {
        return Err(AppError::ServiceUnavailable(
            "no sync client is currently reachable".into(),
        ));
    }

    Ok(Json(TestConnectionResponse {
        success: true,
        message: "sync client reachable".into(),
    }))
}

// ─── Lenient body parsing ────────────────────────────────────

fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_owned)
}
