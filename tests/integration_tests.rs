// Integration tests: HTTP endpoints against an in-memory router

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use common::*;
use device_manager::config::AppConfig;
use device_manager::detector::NewDeviceDetector;
use device_manager::jobs::BatchJobManager;
use device_manager::models::{JobState, ProgressSnapshot};
use device_manager::notify::Notifier;
use device_manager::routes;
use device_manager::store::KnownDeviceStore;
use serde_json::{Value, json};
use std::sync::Arc;

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[router]
rename_pace_ms = 0

[store]
path = "data/known_devices.json"
"#;

struct Harness {
    server: TestServer,
    router: Arc<FakeRouter>,
    jobs: Arc<BatchJobManager>,
    notifier: Arc<RecordingNotifier>,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let router = FakeRouter::with_hosts(sample_hosts());
    let notifier = Arc::new(RecordingNotifier::default());
    let store = KnownDeviceStore::load(dir.path().join(&config.store.path)).await;
    let detector = Arc::new(NewDeviceDetector::new(
        store,
        Some(notifier.clone() as Arc<dyn Notifier>),
    ));
    let jobs = Arc::new(BatchJobManager::new());
    let app = routes::app(service(&router), jobs.clone(), detector, config);
    Harness {
        server: TestServer::try_new(app).unwrap(),
        router,
        jobs,
        notifier,
        _dir: dir,
    }
}

async fn logged_in_harness() -> Harness {
    let h = harness().await;
    h.server
        .post("/api/login")
        .json(&json!({ "host": "192.168.0.1", "password": PASSWORD }))
        .await
        .assert_status_ok();
    h
}

fn device_names(body: &Value) -> Vec<String> {
    body["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_root_and_version() {
    let h = harness().await;
    h.server.get("/").await.assert_status_ok();
    let json: Value = h.server.get("/version").await.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("tplink-device-manager")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_login_requires_fields() {
    let h = harness().await;
    let response = h
        .server
        .post("/api/login")
        .json(&json!({ "host": "192.168.0.1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_malformed_json_gets_error_body() {
    let h = logged_in_harness().await;

    let response = h.server.post("/api/login").text("not json").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().is_some());

    let response = h
        .server
        .put("/api/device/AA:BB:CC:DD:EE:FF/name")
        .bytes("{\"name\":".into())
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["status"], 400);

    let response = h
        .server
        .post("/api/devices/batch-name")
        .json(&json!({ "devices": "nope" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(h.jobs.poll().state, JobState::Idle);
}

#[tokio::test]
async fn test_login_wrong_password_is_unauthorized() {
    let h = harness().await;
    let response = h
        .server
        .post("/api/login")
        .json(&json!({ "host": "192.168.0.1", "password": "nope" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("login failed"));
}

#[tokio::test]
async fn test_devices_before_login_is_unauthorized() {
    let h = harness().await;
    h.server
        .get("/api/devices")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_devices_sorted_by_name_by_default() {
    let h = logged_in_harness().await;
    let body: Value = h.server.get("/api/devices").await.json();
    assert_eq!(
        device_names(&body),
        vec!["11:22:33:44:55:66", "Phone", "TV"]
    );
    let first = &body["devices"][0];
    assert_eq!(first["mac_address"], "11:22:33:44:55:66");
    assert_eq!(first["ip_address"], "192.168.0.5");
    assert_eq!(first["connection_type"], "wired");
    assert_eq!(first["active"], true);
}

#[tokio::test]
async fn test_devices_filter_and_sort() {
    let h = logged_in_harness().await;

    let body: Value = h
        .server
        .get("/api/devices")
        .add_query_param("filter", "custom")
        .add_query_param("sort", "ip")
        .await
        .json();
    assert_eq!(device_names(&body), vec!["TV", "Phone"]);

    let body: Value = h
        .server
        .get("/api/devices")
        .add_query_param("filter", "unnamed")
        .await
        .json();
    assert_eq!(device_names(&body), vec!["11:22:33:44:55:66"]);

    h.server
        .get("/api/devices")
        .add_query_param("sort", "vendor")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_notifies_about_new_devices_once() {
    let h = logged_in_harness().await;
    h.server.get("/api/devices").await.assert_status_ok();
    assert_eq!(h.notifier.calls().len(), 1);
    assert_eq!(h.notifier.calls()[0].len(), 3);

    // Only the still-unnamed device is reported the second time.
    h.server.get("/api/devices").await.assert_status_ok();
    let calls = h.notifier.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].len(), 1);
    assert_eq!(calls[1][0].mac_address.as_str(), "11:22:33:44:55:66");
}

#[tokio::test]
async fn test_rename_single_device() {
    let h = logged_in_harness().await;
    h.server
        .put("/api/device/11-22-33-44-55-66/name")
        .json(&json!({ "name": "Laptop" }))
        .await
        .assert_status_ok();
    assert_eq!(
        h.router.renames(),
        vec![("11-22-33-44-55-66".to_string(), "Laptop".to_string())]
    );

    h.server
        .put("/api/device/11-22-33-44-55-66/name")
        .json(&json!({ "name": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .put("/api/device/zz/name")
        .json(&json!({ "name": "x" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_rejected_by_router() {
    let h = logged_in_harness().await;
    h.router.reject_mac("AA-BB-CC-DD-EE-FF");
    let response = h
        .server
        .put("/api/device/AA:BB:CC:DD:EE:FF/name")
        .json(&json!({ "name": "Phone 2" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("name rejected"));
}

#[tokio::test]
async fn test_progress_before_any_batch() {
    let h = harness().await;
    let progress: ProgressSnapshot = h.server.get("/api/progress").await.json();
    assert_eq!(progress.total, 0);
    assert_eq!(progress.percentage, 0.0);
    assert_eq!(progress.state, JobState::Idle);
}

#[tokio::test]
async fn test_batch_name_runs_in_background() {
    let h = logged_in_harness().await;
    let response = h
        .server
        .post("/api/devices/batch-name")
        .json(&json!({
            "devices": [
                { "mac_address": "aa-bb-cc-dd-ee-ff", "new_name": "Phone 2" },
                { "mac_address": "11:22:33:44:55:66", "new_name": "Laptop" },
                { "mac_address": "bogus", "new_name": "x" },
                { "mac_address": "DE:AD:BE:EF:00:01", "new_name": " " }
            ]
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["summary"]["updates_attempted"], 2);
    assert_eq!(body["summary"]["invalid_count"], 1);
    assert_eq!(body["summary"]["skipped_count"], 1);

    assert_eq!(h.jobs.wait().await, JobState::Completed);
    let progress: ProgressSnapshot = h.server.get("/api/progress").await.json();
    assert_eq!((progress.current, progress.total), (2, 2));
    assert!(progress.completed);
    assert_eq!(progress.latest_result.unwrap().new_name, "Laptop");
}

#[tokio::test]
async fn test_batch_name_without_devices_is_bad_request() {
    let h = logged_in_harness().await;
    h.server
        .post("/api/devices/batch-name")
        .json(&json!({ "devices": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_is_csv_download() {
    let h = logged_in_harness().await;
    let response = h.server.get("/api/devices/export").await;
    response.assert_status_ok();
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"tplink_devices_"));
    assert!(disposition.ends_with(".csv\""));
    assert!(
        response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(response.as_bytes().starts_with(b"\xEF\xBB\xBF"));
}

fn csv_form(file_name: &str, body: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(body.as_bytes().to_vec())
            .file_name(file_name)
            .mime_type("text/csv"),
    )
}

#[tokio::test]
async fn test_import_submits_changed_rows() {
    let h = logged_in_harness().await;
    let csv = "MAC地址,设备名称,IP地址,连接类型,新名称\n\
               AA:BB:CC:DD:EE:FF,Phone,192.168.0.20,wireless_5g,\n\
               11:22:33:44:55:66,11:22:33:44:55:66,192.168.0.5,wired,NewPhone\n\
               not-a-mac,Ghost,,,\n";

    let response = h
        .server
        .post("/api/devices/import")
        .multipart(csv_form("devices.csv", csv))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["summary"]["total_devices"], 3);
    assert_eq!(body["summary"]["updates_attempted"], 1);
    assert_eq!(body["summary"]["unchanged_count"], 1);
    assert_eq!(body["summary"]["invalid_count"], 1);

    assert_eq!(h.jobs.wait().await, JobState::Completed);
    assert_eq!(
        h.router.renames(),
        vec![("11-22-33-44-55-66".to_string(), "NewPhone".to_string())]
    );
}

#[tokio::test]
async fn test_import_of_unmodified_export_has_nothing_to_do() {
    let h = logged_in_harness().await;
    let exported = h.server.get("/api/devices/export").await;
    let csv = String::from_utf8(exported.as_bytes().to_vec()).unwrap();

    let response = h
        .server
        .post("/api/devices/import")
        .multipart(csv_form("devices.csv", &csv))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["details"]["unchanged_count"], 3);
    assert_eq!(h.jobs.poll().state, JobState::Idle);
}

#[tokio::test]
async fn test_import_rejects_non_csv_upload() {
    let h = logged_in_harness().await;
    h.server
        .post("/api/devices/import")
        .multipart(csv_form("devices.xlsx", "mac,new_name\n"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.server
        .post("/api/devices/import")
        .multipart(MultipartForm::new().add_text("note", "no file"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
