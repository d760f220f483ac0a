// Integration tests for the HTTP layer: admin auth on mutations, request
// validation, not-found mapping, and the leaderboard action envelope.
// Each test spins up the real router on an ephemeral port and talks to it
// over HTTP.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use titan_backend::api;
use titan_backend::config::Config;
use titan_backend::db::Database;
use titan_backend::uwu::LogFetcher;

const ADMIN_PASSWORD: &str = "test-admin-secret";

/// Serve the app on 127.0.0.1:0 with an in-memory store; returns the base URL.
async fn spawn_app() -> String {
    sqlx::any::install_default_drivers();
    let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    let fetcher = Arc::new(LogFetcher::new(
        "http://127.0.0.1:9",
        Duration::from_secs(1),
    ));
    let config = Arc::new(Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        admin_password: ADMIN_PASSWORD.to_string(),
        uwu_base_url: "http://127.0.0.1:9".to_string(),
        fetch_timeout_secs: 1,
        static_dir: None,
    });

    let app = api::router(db, fetcher, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

// ── Admin auth ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthenticated_mutations_are_rejected() {
    let base = spawn_app().await;
    let client = client();

    let raid_body = json!({ "date": "2026-02-02", "raidName": "ICC 25 HC" });

    // No password header at all.
    let resp = client
        .post(format!("{base}/api/raids"))
        .json(&raid_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Wrong password.
    let resp = client
        .post(format!("{base}/api/raids"))
        .header("x-admin-password", "nope")
        .json(&raid_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    // Member and guide mutations are gated the same way.
    let resp = client
        .post(format!("{base}/api/members"))
        .json(&json!({ "name": "Athelard", "class": "Paladin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .delete(format!("{base}/api/guides/some-id"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Nothing got through.
    let raids: Value = client
        .get(format!("{base}/api/raids"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(raids.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_authorized_raid_create_and_list() {
    let base = spawn_app().await;
    let client = client();

    let resp = client
        .post(format!("{base}/api/raids"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "date": "2026-02-02", "raidName": "ICC 25 HC" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let raid: Value = resp.json().await.unwrap();
    assert_eq!(raid["raidName"], "ICC 25 HC");
    assert!(raid["id"].is_string());

    // Reads stay open.
    let raids: Value = client
        .get(format!("{base}/api/raids"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(raids.as_array().unwrap().len(), 1);
}

// ── Validation and not-found mapping ─────────────────────────────────

#[tokio::test]
async fn test_member_validation_errors() {
    let base = spawn_app().await;
    let client = client();

    let resp = client
        .post(format!("{base}/api/members"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "name": "Athelard" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "class is required");

    // Duplicate name (case-insensitive) is a 400 with the dedicated message.
    let member = json!({ "name": "Athelard", "class": "Paladin" });
    let resp = client
        .post(format!("{base}/api/members"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&member)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base}/api/members"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "name": "athelard", "class": "Mage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Member with this name already exists");
}

#[tokio::test]
async fn test_missing_raid_is_not_found() {
    let base = spawn_app().await;
    let resp = client()
        .put(format!("{base}/api/raids/no-such-id"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Leaderboard actions ──────────────────────────────────────────────

#[tokio::test]
async fn test_leaderboard_add_and_import_actions() {
    let base = spawn_app().await;
    let client = client();

    let resp = client
        .post(format!("{base}/api/leaderboard"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({
            "action": "add",
            "boss": "Rotface",
            "type": "dps",
            "playerData": {
                "player": "Zalandra",
                "class": "Mage",
                "dps": 8412.5,
                "date": "2026-02-02"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let board: Value = resp.json().await.unwrap();
    assert_eq!(board["dps"]["Rotface"][0]["player"], "Zalandra");

    // Import replaces the whole document and refreshes `generated`.
    let resp = client
        .post(format!("{base}/api/leaderboard"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({
            "action": "import",
            "data": {
                "dps": { "Festergut": [{ "player": "Vexthal", "class": "Warlock", "dps": 9000.0 }] },
                "hps": {},
                "totalLogs": 7,
                "dateRange": { "from": "2026-01-01", "to": "2026-02-02" },
                "generated": "2020-01-01T00:00:00.000Z"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let board: Value = resp.json().await.unwrap();
    assert!(board["dps"]["Rotface"].is_null());
    assert_eq!(board["dps"]["Festergut"][0]["player"], "Vexthal");
    assert_eq!(board["totalLogs"], 7);
    assert_ne!(board["generated"], "2020-01-01T00:00:00.000Z");

    // The persisted document matches what the mutation returned.
    let loaded: Value = client
        .get(format!("{base}/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(loaded["totalLogs"], 7);
}

#[tokio::test]
async fn test_leaderboard_rejects_unknown_action() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/api/leaderboard"))
        .header("x-admin-password", ADMIN_PASSWORD)
        .json(&json!({ "action": "explode" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid action. Use: add, remove, clear, reset, or import"
    );
}

// ── Open endpoints ───────────────────────────────────────────────────

#[tokio::test]
async fn test_roster_parse_needs_no_auth() {
    let base = spawn_app().await;
    let resp = client()
        .post(format!("{base}/api/roster/parse"))
        .json(&json!({ "text": "-Tanks-\n@Alice blood dk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["composition"]["tanks"][0]["name"], "Alice");
    assert_eq!(body["parseStats"]["playersExtracted"], 1);
}
