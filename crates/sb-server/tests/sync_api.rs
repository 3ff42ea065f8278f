//! Integration tests for the sync bridge HTTP surface.
//!
//! Builds the real router in-process and drives it request-by-request; no
//! sockets, no sleeps.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use sb_common::AppConfig;
use sb_server::{app, AppState};

fn test_app() -> Router {
    app(Arc::new(AppState::new(AppConfig::default())))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_is_available() {
    let response = test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "sb-server");
}

#[tokio::test]
async fn register_echoes_client_id_and_derives_api_key() {
    let response = test_app()
        .oneshot(post_json(
            "/register",
            json!({
                "clientId": "tally-primary",
                "companyName": "Acme Trading",
                "version": "2.1.0",
                "ipAddress": "10.0.0.5"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["clientId"], "tally-primary");
    assert_eq!(body["apiKey"], "sbk-tally-primary");
}

#[tokio::test]
async fn register_without_body_uses_default_identity() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/register")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["clientId"], "desktop-agent");
}

#[tokio::test]
async fn malformed_body_falls_back_to_default_identity() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/heartbeat")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    // An ill-typed clientId is treated the same as a missing one.
    let response = app
        .clone()
        .oneshot(post_json("/heartbeat", json!({ "clientId": 42 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let clients = body_json(app.oneshot(get("/clients")).await.unwrap()).await;
    assert_eq!(clients.as_array().unwrap().len(), 1);
    assert_eq!(clients[0]["clientId"], "desktop-agent");
}

#[tokio::test]
async fn heartbeat_then_status_reports_connected() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json("/heartbeat", json!({ "clientId": "agent-a" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let heartbeat = body_json(response).await;
    assert_eq!(heartbeat["success"], true);
    assert!(heartbeat["timestamp"].is_string());

    let status = body_json(app.oneshot(get("/sync/status")).await.unwrap()).await;
    assert_eq!(status["isConnected"], true);
    assert_eq!(status["connectedClients"], 1);
    assert_eq!(status["status"], "connected");
    assert!(status["lastSync"].is_string());
}

#[tokio::test]
async fn status_without_clients_reports_disconnected() {
    let status = body_json(test_app().oneshot(get("/sync/status")).await.unwrap()).await;
    assert_eq!(status["isConnected"], false);
    assert_eq!(status["connectedClients"], 0);
    assert_eq!(status["status"], "disconnected");
    assert!(status["lastSync"].is_null());
}

#[tokio::test]
async fn test_connection_fails_with_503_when_no_client_is_live() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/test-connection")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_connection_succeeds_once_a_client_is_live() {
    let app = test_app();

    app.clone()
        .oneshot(post_json("/heartbeat", json!({ "clientId": "agent-a" })))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/test-connection")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
}

#[tokio::test]
async fn clients_lists_raw_records() {
    let app = test_app();

    app.clone()
        .oneshot(post_json(
            "/register",
            json!({ "clientId": "agent-a", "companyName": "Acme Trading" }),
        ))
        .await
        .unwrap();

    let clients = body_json(app.oneshot(get("/clients")).await.unwrap()).await;
    let clients = clients.as_array().unwrap();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["clientId"], "agent-a");
    assert_eq!(clients[0]["status"], "connected");
    assert_eq!(clients[0]["companyName"], "Acme Trading");
    assert!(clients[0]["lastHeartbeat"].is_string());
    assert!(clients[0]["registeredAt"].is_string());
}

#[tokio::test]
async fn concurrent_heartbeats_register_every_client() {
    let app = test_app();

    let mut handles = Vec::new();
    for i in 0..12 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(post_json(
                    "/heartbeat",
                    json!({ "clientId": format!("agent-{i}") }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let clients = body_json(app.oneshot(get("/clients")).await.unwrap()).await;
    let mut ids: Vec<String> = clients
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["clientId"].as_str().unwrap().to_string())
        .collect();
    ids.sort();

    let mut expected: Vec<String> = (0..12).map(|i| format!("agent-{i}")).collect();
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn unknown_route_returns_the_error_envelope() {
    let response = test_app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["success"], false);
}
