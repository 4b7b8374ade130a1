use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use keygate_core::TenancyMode;
use keygate_server::{AppState, Config};
use keygate_storage::Database;
use serde_json::{Value, json};
use std::net::SocketAddr;
use tower::ServiceExt;

const LOBBY: &str = "10.0.0.5";
const UNKNOWN: &str = "10.9.9.9";

async fn spawn_app_with(config: Config) -> Router {
    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = AppState::with_database(config, db).expect("Failed to create app state");
    keygate_server::api::router(state)
}

async fn spawn_app() -> Router {
    spawn_app_with(Config::default()).await
}

fn peer(ip: &str) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::new(ip.parse().unwrap(), 40_000))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    from: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(peer(from));

    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn verify(app: &Router, from: &str, pin: &str) -> (StatusCode, Value) {
    send(app, "POST", "/api/access/verify", from, Some(json!({ "pin": pin }))).await
}

/// Registers "Lobby" at 10.0.0.5 with user "ana" (PIN 4821). Returns the
/// device id.
async fn seed_lobby(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Lobby", "address": LOBBY, "description": "Front door" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let device_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        app,
        "POST",
        "/api/users",
        "127.0.0.1",
        Some(json!({
            "device_id": device_id,
            "username": "ana",
            "first_name": "Ana",
            "last_name": "Souza",
            "pin": "4821"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    device_id
}

async fn log_count(app: &Router) -> usize {
    let (status, body) = send(app, "GET", "/api/logs", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].as_array().unwrap().len()
}

#[tokio::test]
async fn test_status() {
    let app = spawn_app().await;

    let (status, body) = send(&app, "GET", "/api/status", "127.0.0.1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");
    assert_eq!(body["data"]["tenancy"], "multi");
}

#[tokio::test]
async fn test_verify_admin_user_and_deny() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (status, body) = verify(&app, LOBBY, "8729").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_granted"], true);
    assert_eq!(body["reason"], "admin");
    assert_eq!(body["device_name"], "Lobby");
    assert_eq!(body["door_open_seconds"], 5);
    assert!(body.get("user_name").is_none());

    let (status, body) = verify(&app, LOBBY, "4821").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "user");
    assert_eq!(body["user_name"], "ana");
    assert_eq!(body["message"], "Acesso autorizado para ana");

    let (status, body) = verify(&app, LOBBY, "0000").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], true);
    assert_eq!(body["access_granted"], false);
    assert_eq!(body["reason"], "no_match");
    assert_eq!(body["message"], "PIN invalido - Acesso negado");
    assert!(body.get("door_open_seconds").is_none());

    assert_eq!(log_count(&app).await, 3);
}

#[tokio::test]
async fn test_access_alias_route() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (status, body) = send(&app, "POST", "/api/access", LOBBY, Some(json!({ "pin": "4821" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "user");
}

#[tokio::test]
async fn test_malformed_pin_is_not_logged() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    for pin in ["48", "48a1", "48211", ""] {
        let (status, body) = verify(&app, LOBBY, pin).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "pin {pin:?}");
        assert_eq!(body["success"], false);
        assert_eq!(body["access_granted"], false);
    }

    let (status, body) = send(&app, "POST", "/api/access/verify", LOBBY, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "PIN nao fornecido");

    assert_eq!(log_count(&app).await, 0);
}

#[tokio::test]
async fn test_unknown_device_is_not_logged() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (status, body) = verify(&app, UNKNOWN, "8729").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Dispositivo nao cadastrado");

    let (status, _) = send(
        &app,
        "POST",
        "/api/access/verify",
        UNKNOWN,
        Some(json!({ "pin": "8729", "device_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(log_count(&app).await, 0);
}

#[tokio::test]
async fn test_device_id_must_match_origin() {
    let app = spawn_app().await;
    let lobby_id = seed_lobby(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Garage", "address": "10.0.0.6" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/access/verify",
        LOBBY,
        Some(json!({ "pin": "4821", "device_id": lobby_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["device_name"], "Lobby");

    // Garage keypad and an unregistered host naming the Lobby
    for from in ["10.0.0.6", UNKNOWN] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/access/verify",
            from,
            Some(json!({ "pin": "4821", "device_id": lobby_id })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{from}");
        assert_eq!(body["access_granted"], false);
    }

    assert_eq!(log_count(&app).await, 1);
}

#[tokio::test]
async fn test_device_isolation() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Garage", "address": "10.0.0.6" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = verify(&app, "10.0.0.6", "4821").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["device_name"], "Garage");
}

#[tokio::test]
async fn test_forwarded_for_requires_trusted_proxy() {
    let mut config = Config::default();
    config.server.trusted_proxy_ips = vec!["127.0.0.1".to_string()];
    let app = spawn_app_with(config).await;
    seed_lobby(&app).await;

    let request = |from: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/access/verify")
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", format!("{LOBBY}, 127.0.0.1"))
            .extension(peer(from))
            .body(Body::from(json!({ "pin": "4821" }).to_string()))
            .unwrap()
    };

    let response = app.clone().oneshot(request("127.0.0.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Header from an untrusted peer is ignored
    let response = app.clone().oneshot(request(UNKNOWN)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inactive_device_is_not_resolved() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/devices/{device_id}/active"),
        "127.0.0.1",
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, _) = verify(&app, LOBBY, "8729").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_inactive_user_does_not_match() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (_, users) = send(&app, "GET", "/api/users", "127.0.0.1", None).await;
    let user_id = users["data"][0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/active"),
        "127.0.0.1",
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = verify(&app, LOBBY, "4821").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_device_conflict() {
    let app = spawn_app().await;
    seed_lobby(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Other", "address": LOBBY })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("address"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Lobby", "address": "10.0.0.7" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_invalid_registration_input() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/devices",
        "127.0.0.1",
        Some(json!({ "name": "Lab", "address": "lab.local" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        "127.0.0.1",
        Some(json!({ "device_id": device_id, "username": "bob", "pin": "12" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Missing required field
    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        "127.0.0.1",
        Some(json!({ "device_id": device_id, "pin": "1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        "127.0.0.1",
        Some(json!({ "device_id": 999, "username": "bob", "pin": "1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users_never_expose_pin() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/users?device_id={device_id}"),
        "127.0.0.1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "ana");
    assert!(users[0].get("pin").is_none());
    assert!(users[0].get("password").is_none());
}

#[tokio::test]
async fn test_device_config_update() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;
    let uri = format!("/api/devices/{device_id}/config");

    let (status, body) = send(&app, "GET", &uri, "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stored"], true);
    assert_eq!(body["data"]["door_open_duration"], 5);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        "127.0.0.1",
        Some(json!({ "admin_pin": "1111", "door_open_duration": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = verify(&app, LOBBY, "1111").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "admin");
    assert_eq!(body["door_open_seconds"], 9);

    let (status, _) = verify(&app, LOBBY, "8729").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        "127.0.0.1",
        Some(json!({ "door_open_duration": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/devices/999/config", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_config() {
    let mut config = Config::default();
    config.access.tenancy = TenancyMode::SingleTenant;
    let app = spawn_app_with(config).await;

    let (status, body) = send(&app, "GET", "/api/config", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stored"], false);
    assert_eq!(body["data"]["admin_pin"], "8729");

    let (status, body) = send(
        &app,
        "PUT",
        "/api/config",
        "127.0.0.1",
        Some(json!({ "max_login_attempts": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["max_login_attempts"], 7);

    let (_, body) = send(&app, "GET", "/api/config", "127.0.0.1", None).await;
    assert_eq!(body["data"]["stored"], true);
    assert_eq!(body["data"]["max_login_attempts"], 7);
}

#[tokio::test]
async fn test_global_config_update_rejected_in_multi_tenant_mode() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "PUT",
        "/api/config",
        "127.0.0.1",
        Some(json!({ "admin_pin": "1111" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("/api/devices/"));

    let (status, body) = send(&app, "GET", "/api/config", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stored"], false);
    assert_eq!(body["data"]["admin_pin"], "8729");
}

#[tokio::test]
async fn test_logs_listing() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;

    verify(&app, LOBBY, "4821").await;
    verify(&app, LOBBY, "0000").await;

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/logs?device_id={device_id}&limit=1"),
        "127.0.0.1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["reason"], "no_match");
    assert_eq!(logs[0]["device_name"], "Lobby");
    assert_eq!(logs[0]["success"], false);

    for query in ["limit=0", "limit=1001", "limit=abc"] {
        let (status, _) = send(&app, "GET", &format!("/api/logs?{query}"), "127.0.0.1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
    }

    let (status, _) = send(&app, "GET", "/api/logs?device_id=999", "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_keeps_logs() {
    let app = spawn_app().await;
    seed_lobby(&app).await;
    verify(&app, LOBBY, "4821").await;

    let (_, users) = send(&app, "GET", "/api/users", "127.0.0.1", None).await;
    let user_id = users["data"][0]["id"].as_i64().unwrap();

    let uri = format!("/api/users/{user_id}");
    let (status, _) = send(&app, "DELETE", &uri, "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &uri, "127.0.0.1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, logs) = send(&app, "GET", "/api/logs", "127.0.0.1", None).await;
    assert_eq!(logs["data"].as_array().unwrap().len(), 1);
    assert!(logs["data"][0]["user_id"].is_null());
    assert_eq!(logs["data"][0]["success"], true);
}

#[tokio::test]
async fn test_delete_device_cascades() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;
    verify(&app, LOBBY, "4821").await;

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/devices/{device_id}"),
        "127.0.0.1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, devices) = send(&app, "GET", "/api/devices", "127.0.0.1", None).await;
    assert!(devices["data"].as_array().unwrap().is_empty());
    let (_, users) = send(&app, "GET", "/api/users", "127.0.0.1", None).await;
    assert!(users["data"].as_array().unwrap().is_empty());
    assert_eq!(log_count(&app).await, 0);
}

#[tokio::test]
async fn test_update_device_address() {
    let app = spawn_app().await;
    let device_id = seed_lobby(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/devices/{device_id}/address"),
        "127.0.0.1",
        Some(json!({ "address": "::ffff:10.0.0.8" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["address"], "10.0.0.8");

    let (status, _) = verify(&app, LOBBY, "4821").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = verify(&app, "10.0.0.8", "4821").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_single_tenant_mode() {
    let mut config = Config::default();
    config.access.tenancy = TenancyMode::SingleTenant;
    let app = spawn_app_with(config).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/users",
        "127.0.0.1",
        Some(json!({ "username": "ana", "pin": "4821" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Any origin resolves to the implicit device
    let (status, body) = verify(&app, UNKNOWN, "4821").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_name"], "ana");
    assert!(body.get("device_name").is_none());

    let (status, body) = verify(&app, "10.1.1.1", "8729").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "admin");

    let (_, logs) = send(&app, "GET", "/api/logs", "127.0.0.1", None).await;
    assert!(logs["data"][0]["device_id"].is_null());
}
