use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The error taxonomy shared by every HTTP-facing and storage crate in the
/// workspace (spec §7). Variants carry enough context to render an
/// AWS-shaped JSON error body without the HTTP layer needing to know which
/// internal operation failed.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("request too large: {0}")]
    RequestTooLarge(String),

    #[error("service error: {0}")]
    ServiceError(String),

    #[error("timed out: {0}")]
    Timeout(String),
}

impl ErrorKind {
    pub fn service(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }

    /// The AWS exception name carried in the JSON error body (§6.1/§7).
    pub fn aws_type(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter(_) => "InvalidParameterValueException",
            ErrorKind::ResourceConflict(_) => "ResourceConflictException",
            ErrorKind::ResourceNotFound(_) => "ResourceNotFoundException",
            ErrorKind::RequestTooLarge(_) => "RequestTooLargeException",
            ErrorKind::ServiceError(_) => "ServiceException",
            ErrorKind::Timeout(_) => "ServiceException",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ErrorKind::ResourceConflict(_) => StatusCode::CONFLICT,
            ErrorKind::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::RequestTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::ServiceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Timeout is the one AWS-compatible degraded path that responds
            // 200 with an error body instead of a failing status (§7).
            ErrorKind::Timeout(_) => StatusCode::OK,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "errorType")]
    error_type: String,
    #[serde(rename = "errorMessage")]
    error_message: String,
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        if let ErrorKind::Timeout(_) = &self {
            // §4.7/§7: on timeout the invocation response is AWS-compatible
            // and carries only `{"error": "..."}`, not the generic envelope.
            return (
                StatusCode::OK,
                axum::Json(serde_json::json!({ "error": "function timed out" })),
            )
                .into_response();
        }

        let body = ErrorBody {
            error_type: self.aws_type().to_string(),
            error_message: self.to_string(),
        };
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<std::io::Error> for ErrorKind {
    fn from(e: std::io::Error) -> Self {
        ErrorKind::ServiceError(e.to_string())
    }
}

impl From<serde_json::Error> for ErrorKind {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::ServiceError(format!("json codec error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ErrorKind>;
