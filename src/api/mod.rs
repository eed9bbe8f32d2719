use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{index::IndexError, search::SearchError};

pub mod recommendations;
pub mod search;

/// Result alias for JSON payloads that map API errors automatically.
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Machine-readable error codes surfaced in the JSON envelope.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    ResourceNotFound,
    MethodNotAllowed,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorCode {
    fn default_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Error envelope returned to HTTP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// Canonical API error that converts into the shared JSON envelope.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.default_status(),
            code,
            message: message.into(),
        }
    }

    /// Build a validation/parameter error (HTTP 400).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Build a resource-not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Build a method-not-allowed error (HTTP 405).
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotAllowed, message)
    }

    /// Build a retryable service error (HTTP 503).
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Expose the HTTP status code for logging/tests.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Expose the machine-readable code for logging/tests.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidRequest(message) => Self::bad_request(message),
            SearchError::NotFound(identifier) => {
                Self::not_found(format!("work '{identifier}' not found"))
            }
            SearchError::Index(IndexError::Unavailable(message)) => {
                Self::service_unavailable(format!("index unavailable: {message}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError {
            status,
            code,
            message,
        } = self;

        if matches!(
            status,
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE
        ) {
            tracing::error!(
                code = ?code,
                status = %status,
                message = message.as_str(),
                "api error (critical)"
            );
        } else {
            tracing::warn!(
                code = ?code,
                status = %status,
                message = message.as_str(),
                "api error"
            );
        }

        let payload = ErrorResponse {
            error: ErrorBody { code, message },
        };
        let mut response = (status, Json(payload)).into_response();
        response
            .extensions_mut()
            .insert(ErrorEnvelopeApplied::default());
        response
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ErrorEnvelopeApplied;

/// Middleware that rewrites Axum default errors into the shared envelope.
pub async fn ensure_error_envelope(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if (status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_FOUND)
        && response
            .extensions()
            .get::<ErrorEnvelopeApplied>()
            .is_none()
    {
        return match status {
            StatusCode::METHOD_NOT_ALLOWED => {
                ApiError::method_not_allowed("method not allowed").into_response()
            }
            StatusCode::NOT_FOUND => ApiError::not_found("route not found").into_response(),
            _ => unreachable!(),
        };
    }

    response
}

/// Fallback handler ensuring unknown routes return the API envelope.
pub async fn fallback_handler() -> ApiError {
    ApiError::not_found("route not found")
}
