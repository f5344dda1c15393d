//! End-to-end HTTP tests for the function service surface (spec §6.1, §8).

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use burrow_lambda::{FunctionManager, ManagerConfig};
use burrow_lambda_http::AppState;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// A 22-byte empty zip archive (just the end-of-central-directory record),
/// valid enough for `unzip` to accept as a no-op extraction.
const EMPTY_ZIP: [u8; 22] = [
    0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

fn app(tmp: &tempfile::TempDir) -> axum::Router {
    let config = ManagerConfig {
        metadata_dir: tmp.path().join("metadata"),
        zips_dir: tmp.path().join("zips"),
        install_base: tmp.path().join("installs"),
        worker_host_bin: PathBuf::from("/bin/true"),
        result_woof_count: 2,
        call_woof_el_size: 16 * 1024,
        invocation_timeout_ms: 1_000,
    };
    let manager = Arc::new(FunctionManager::new(config));
    burrow_lambda_http::gen_router().with_state(AppState::new(manager))
}

fn create_body(name: &str, handler: &str, zip: &[u8]) -> String {
    use base64::Engine;
    serde_json::json!({
        "FunctionName": name,
        "Handler": handler,
        "Code": { "ZipFile": base64::engine::general_purpose::STANDARD.encode(zip) },
    })
    .to_string()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_function_returns_metadata_without_code() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);

    let resp = app
        .oneshot(
            Request::post("/2015-03-31/functions")
                .header("content-type", "application/json")
                .body(Body::from(create_body("echo", "main.handler", &EMPTY_ZIP)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["FunctionName"], "echo");
    assert_eq!(body["Handler"], "main.handler");
    assert!(body.get("Code").is_none());
    assert!(body["CodeSha256"].is_string());
    assert_eq!(body["CodeSize"], EMPTY_ZIP.len());
}

#[tokio::test]
async fn create_function_twice_conflicts() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);
    let body = create_body("echo", "main.handler", &EMPTY_ZIP);

    let first = app
        .clone()
        .oneshot(Request::post("/2015-03-31/functions").header("content-type", "application/json").body(Body::from(body.clone())).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(Request::post("/2015-03-31/functions").header("content-type", "application/json").body(Body::from(body)).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn create_function_rejects_handler_without_a_dot() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);

    let resp = app
        .oneshot(
            Request::post("/2015-03-31/functions")
                .header("content-type", "application/json")
                .body(Body::from(create_body("echo", "nodothandler", &EMPTY_ZIP)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_function_rejects_missing_zip_file() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);
    let body = serde_json::json!({ "FunctionName": "echo", "Handler": "main.handler", "Code": {} }).to_string();

    let resp = app
        .oneshot(Request::post("/2015-03-31/functions").header("content-type", "application/json").body(Body::from(body)).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_code_of_unknown_function_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);
    use base64::Engine;
    let body = serde_json::json!({
        "ZipFile": base64::engine::general_purpose::STANDARD.encode(EMPTY_ZIP),
    })
    .to_string();

    let resp = app
        .oneshot(
            Request::put("/2015-03-31/functions/never-created/code")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_invoke_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);

    app.clone()
        .oneshot(
            Request::post("/2015-03-31/functions")
                .header("content-type", "application/json")
                .body(Body::from(create_body("echo", "main.handler", &EMPTY_ZIP)))
                .unwrap(),
        )
        .await
        .unwrap();

    let deleted = app
        .clone()
        .oneshot(Request::delete("/2015-03-31/functions/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let invoked = app
        .oneshot(
            Request::post("/2015-03-31/functions/echo/invocations")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(invoked.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoke_with_oversized_payload_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ManagerConfig {
        metadata_dir: tmp.path().join("metadata"),
        zips_dir: tmp.path().join("zips"),
        install_base: tmp.path().join("installs"),
        worker_host_bin: PathBuf::from("/bin/true"),
        result_woof_count: 2,
        call_woof_el_size: 10,
        invocation_timeout_ms: 1_000,
    };
    let manager = Arc::new(FunctionManager::new(config));
    let app = burrow_lambda_http::gen_router().with_state(AppState::new(manager));

    app.clone()
        .oneshot(
            Request::post("/2015-03-31/functions")
                .header("content-type", "application/json")
                .body(Body::from(create_body("echo", "main.handler", &EMPTY_ZIP)))
                .unwrap(),
        )
        .await
        .unwrap();

    let resp = app
        .oneshot(
            Request::post("/2015-03-31/functions/echo/invocations")
                .body(Body::from("{\"x\":1}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(&tmp);
    let resp = app.oneshot(Request::get("/healthz").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
