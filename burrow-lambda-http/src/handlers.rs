//! Request handlers for the function-service HTTP surface (spec §6.1).

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use burrow_core::ErrorKind;
use burrow_lambda::{FunctionProperties, InvocationResult};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::AppState;

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateFunctionRequest {
    #[serde(rename = "FunctionName")]
    function_name: Option<String>,
    #[serde(rename = "Handler")]
    handler: Option<String>,
    #[serde(rename = "Code")]
    code: Option<CodeRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    #[serde(rename = "ZipFile")]
    zip_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCodeRequest {
    #[serde(rename = "ZipFile")]
    zip_file: Option<String>,
}

#[derive(Debug, Serialize)]
struct FunctionMetadataResponse {
    #[serde(rename = "FunctionName")]
    function_name: String,
    #[serde(rename = "Handler")]
    handler: String,
    #[serde(rename = "CodeSha256")]
    code_sha256: String,
    #[serde(rename = "CodeSize")]
    code_size: usize,
}

impl FunctionMetadataResponse {
    fn new(props: &FunctionProperties, code_size: usize) -> Self {
        Self {
            function_name: props.name.clone(),
            handler: props.handler.clone(),
            code_sha256: props.code_sha256().to_string(),
            code_size,
        }
    }
}

fn decode_zip(zip_file_b64: Option<String>) -> Result<Vec<u8>, ErrorKind> {
    let encoded = zip_file_b64.ok_or_else(|| ErrorKind::InvalidParameter("missing ZipFile".to_string()))?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ErrorKind::InvalidParameter(format!("ZipFile is not valid base64: {e}")))
}

#[instrument(skip(state, req), fields(function = req.function_name.as_deref().unwrap_or("")))]
pub async fn create_function(
    State(state): State<AppState>,
    Json(req): Json<CreateFunctionRequest>,
) -> Result<Response, ErrorKind> {
    let name = req
        .function_name
        .ok_or_else(|| ErrorKind::InvalidParameter("missing FunctionName".to_string()))?;
    let handler = req
        .handler
        .ok_or_else(|| ErrorKind::InvalidParameter("missing Handler".to_string()))?;
    let zip_bytes = decode_zip(req.code.and_then(|c| c.zip_file))?;

    let props = state
        .manager
        .create(&name, &handler, &zip_bytes)
        .await
        .map_err(ErrorKind::from)?;

    Ok((StatusCode::OK, Json(FunctionMetadataResponse::new(&props, zip_bytes.len()))).into_response())
}

#[instrument(skip(state, req), fields(function = %name))]
pub async fn update_function_code(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<UpdateCodeRequest>,
) -> Result<Response, ErrorKind> {
    let zip_bytes = decode_zip(req.zip_file)?;
    let props = state
        .manager
        .update_code(&name, &zip_bytes)
        .await
        .map_err(ErrorKind::from)?;
    Ok((StatusCode::OK, Json(FunctionMetadataResponse::new(&props, zip_bytes.len()))).into_response())
}

#[instrument(skip(state), fields(function = %name))]
pub async fn delete_function(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response, ErrorKind> {
    state.manager.delete(&name).await.map_err(ErrorKind::from)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `X-Amz-Invocation-Type` defaults to `RequestResponse` (spec §6.1, §9:
/// this normalises on a single header rather than also accepting the
/// source's `X-Amz-Client-Context` path).
fn is_request_response(headers: &HeaderMap) -> bool {
    match headers.get("x-amz-invocation-type").and_then(|v| v.to_str().ok()) {
        Some("Event") => false,
        _ => true,
    }
}

#[instrument(skip(state, headers, body), fields(function = %name))]
pub async fn invoke_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ErrorKind> {
    let request_response = is_request_response(&headers);
    let result = state
        .manager
        .invoke(&name, &body, request_response)
        .await
        .map_err(ErrorKind::from)?;

    match result {
        InvocationResult::Payload(bytes) => Ok((
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response()),
        InvocationResult::TimedOut => Ok(ErrorKind::Timeout("no result observed before the invocation deadline".to_string()).into_response()),
        InvocationResult::Fired => Ok(StatusCode::OK.into_response()),
    }
}
