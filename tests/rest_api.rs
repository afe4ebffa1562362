//! End-to-end tests for the REST surface.
//!
//! Each test boots the real axum server on a random port over a
//! tempdir-backed local store and talks to it over HTTP.

use campscored::auth;
use campscored::codec::{encode, Record, RECORD_COLUMNS};
use campscored::config::{AuthConfig, DaemonConfig, StorageBackend, StorageConfig};
use campscored::records::{ADMINS_PATH, SCORERS_PATH};
use campscored::rest;
use campscored::storage::{BlobStore, LocalBlobStore};
use campscored::AppContext;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const TEST_SECRET: &str = "test-secret";

/// Find a free local port by binding to port 0.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn test_config(dir: &TempDir, port: u16, backend: StorageBackend) -> DaemonConfig {
    DaemonConfig {
        port,
        bind_address: "127.0.0.1".to_string(),
        data_dir: dir.path().to_path_buf(),
        log: "error".to_string(),
        log_format: "pretty".to_string(),
        storage: StorageConfig {
            backend,
            base_url: "http://unused.invalid".to_string(),
            token: None,
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
        },
    }
}

/// Boot the server, wait until it accepts connections, return its base URL.
async fn start_server(dir: &TempDir, backend: StorageBackend) -> String {
    let port = find_free_port();
    let ctx = Arc::new(AppContext::new(test_config(dir, port, backend)));
    tokio::spawn(rest::start_rest_server(ctx));

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return format!("http://127.0.0.1:{port}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up on port {port}");
}

fn local_store(dir: &TempDir) -> LocalBlobStore {
    LocalBlobStore::new(dir.path().to_path_buf())
}

fn record(id: usize, scout: &str, real: &str, group: &str, hash: &str) -> Record {
    Record {
        id,
        scout_name: scout.to_string(),
        real_name: real.to_string(),
        scout_group: group.to_string(),
        password_hash: hash.to_string(),
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;

    let body: Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn admin_crud_cycle() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;
    let client = reqwest::Client::new();

    // First GET seeds the bootstrap admin.
    let admins: Value = client
        .get(format!("{base}/api/admins"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(admins.as_array().unwrap().len(), 1);
    assert_eq!(admins[0]["scoutName"], "Chip");
    assert!(admins[0].get("passwordHash").is_none());

    // Add.
    let admins: Value = client
        .post(format!("{base}/api/admins"))
        .json(&json!({
            "scoutName": "Ash",
            "realName": "Ash Ketchum",
            "scoutGroup": "4th Oak",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(admins.as_array().unwrap().len(), 2);
    assert_eq!(admins[1]["id"], 1);

    // Update, id as a string — the frontend sends form values.
    let admins: Value = client
        .put(format!("{base}/api/admins"))
        .json(&json!({
            "id": "1",
            "scoutName": "Ash",
            "realName": "Ashley Ketchum",
            "scoutGroup": "4th Oak",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(admins[1]["realName"], "Ashley Ketchum");

    // Delete record 0; the remaining record re-indexes to id 0.
    let admins: Value = client
        .delete(format!("{base}/api/admins?id=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let admins = admins.as_array().unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0]["id"], 0);
    assert_eq!(admins[0]["scoutName"], "Ash");
}

#[tokio::test]
async fn admin_validation_and_not_found_statuses() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;
    let client = reqwest::Client::new();

    client.get(format!("{base}/api/admins")).send().await.unwrap();

    // Blank field → 400.
    let res = client
        .post(format!("{base}/api/admins"))
        .json(&json!({ "scoutName": "Ash", "realName": "  ", "scoutGroup": "4th Oak" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Unparseable id → 400.
    let res = client
        .delete(format!("{base}/api/admins?id=abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    // Out-of-range id → 404, with the roster-specific message.
    let res = client
        .put(format!("{base}/api/admins"))
        .json(&json!({ "id": 99, "scoutName": "X", "realName": "Y", "scoutGroup": "Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Admin not found");

    // Unknown method on a known path → 405.
    let res = client
        .patch(format!("{base}/api/admins"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 405);
}

#[tokio::test]
async fn scorer_routes_use_their_own_file_and_messages() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;
    let client = reqwest::Client::new();

    // Fresh scorer list is empty, not the admin seed.
    let scorers: Value = client
        .get(format!("{base}/api/scorers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(scorers.as_array().unwrap().is_empty());

    let res = client
        .delete(format!("{base}/api/scorers?id=7"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Scorer not found");
}

#[tokio::test]
async fn login_setup_and_identity_flow() {
    let dir = TempDir::new().unwrap();

    // A legacy scorer file from before the password column existed.
    local_store(&dir)
        .write(
            SCORERS_PATH,
            "scout_name,real_name,scout_group\n\"Misty\",\"Misty Waters\",\"3rd Cerulean\"",
        )
        .await
        .unwrap();

    let base = start_server(&dir, StorageBackend::Local).await;
    let client = reqwest::Client::new();

    // Legacy file means setup is pending.
    let body: Value = client
        .get(format!("{base}/api/setup"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["needsSetup"], true);

    // No password yet → login refused.
    let res = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "scoutName": "Misty", "password": "staryu" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    // Set the password through the setup endpoint.
    let res = client
        .post(format!("{base}/api/setup"))
        .json(&json!({ "scoutName": "misty", "password": "staryu", "userType": "scorer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    // Second attempt is forbidden.
    let res = client
        .post(format!("{base}/api/setup"))
        .json(&json!({ "scoutName": "Misty", "password": "other", "userType": "scorer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    // Wrong password → 401; right password → token + user payload.
    let res = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "scoutName": "Misty", "password": "psyduck" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);

    let body: Value = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "scoutName": "MISTY", "password": "staryu" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["user"]["scoutName"], "Misty");
    assert_eq!(body["user"]["userType"], "scorer");
    let token = body["token"].as_str().unwrap().to_string();

    // The token round-trips through /api/me.
    let me: Value = client
        .get(format!("{base}/api/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["scoutName"], "Misty");
    assert_eq!(me["scoutGroup"], "3rd Cerulean");

    let res = client
        .get(format!("{base}/api/me"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn admins_outrank_scorers_at_login() {
    let dir = TempDir::new().unwrap();
    let store = local_store(&dir);

    let hash = auth::hash_password("onix").unwrap();
    store
        .write(
            ADMINS_PATH,
            &encode(
                &[record(0, "Brock", "Brock Stone", "2nd Pewter", &hash)],
                &RECORD_COLUMNS,
            ),
        )
        .await
        .unwrap();
    store
        .write(
            SCORERS_PATH,
            &encode(
                &[record(0, "Brock", "Brock Stone", "2nd Pewter", &hash)],
                &RECORD_COLUMNS,
            ),
        )
        .await
        .unwrap();

    let base = start_server(&dir, StorageBackend::Local).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{base}/api/login"))
        .json(&json!({ "scoutName": "Brock", "password": "onix" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["user"]["userType"], "admin");
}

#[tokio::test]
async fn setup_rejects_bad_requests() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/api/setup"))
        .json(&json!({ "scoutName": "Chip", "password": "x", "userType": "referee" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let res = client
        .post(format!("{base}/api/setup"))
        .json(&json!({ "scoutName": "Chip" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn unconfigured_remote_storage_answers_503() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Remote).await;

    let res = reqwest::get(format!("{base}/api/admins")).await.unwrap();
    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Storage not configured");
}

#[tokio::test]
async fn preflight_gets_open_cors_headers() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, StorageBackend::Local).await;

    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/admins"))
        .header("origin", "http://example.org")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
