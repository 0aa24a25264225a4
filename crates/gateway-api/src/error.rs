//! HTTP error mapping: a status plus a message, `IntoResponse`'d as a
//! small JSON envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_core::GatewayError;
use gateway_providers::debrid::DebridError;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorBody { error: self.message, status: status.as_u16() });
        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(msg) => Self::bad_request(msg),
            GatewayError::RateLimited => Self::new(StatusCode::TOO_MANY_REQUESTS, "rate limited"),
            GatewayError::Overloaded => Self::new(StatusCode::SERVICE_UNAVAILABLE, "overloaded"),
            GatewayError::UpstreamTimeout(msg) => Self::new(StatusCode::GATEWAY_TIMEOUT, msg),
            GatewayError::UpstreamError(msg) => Self::new(StatusCode::BAD_GATEWAY, msg),
            GatewayError::DebridAuthInvalid => Self::new(StatusCode::UNAUTHORIZED, "debrid key invalid"),
            GatewayError::DebridBlocked => Self::new(StatusCode::FORBIDDEN, "debrid provider blocked this request"),
            GatewayError::DebridTransient => Self::new(StatusCode::BAD_GATEWAY, "debrid provider temporarily unavailable"),
            GatewayError::DebridNoFiles => Self::not_found("no playable files"),
            GatewayError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                Self::internal("internal error")
            }
        }
    }
}

impl From<DebridError> for ApiError {
    fn from(err: DebridError) -> Self {
        match err {
            DebridError::AuthInvalid => Self::new(StatusCode::UNAUTHORIZED, "debrid key invalid"),
            DebridError::RateLimited => Self::new(StatusCode::TOO_MANY_REQUESTS, "debrid provider rate limited"),
            DebridError::Transient => Self::new(StatusCode::BAD_GATEWAY, "debrid provider temporarily unavailable"),
            DebridError::NoServer => Self::new(StatusCode::FORBIDDEN, "debrid provider unavailable for this key"),
            DebridError::NoFiles => Self::not_found("no playable files"),
            DebridError::Timeout => Self::new(StatusCode::GATEWAY_TIMEOUT, "debrid resolution timed out"),
        }
    }
}
