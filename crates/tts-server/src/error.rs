//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    extract::rejection::{JsonRejection, QueryRejection},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tts_core::TtsError;

/// Error returned by handlers, rendered as a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.into(),
        }
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self.status {
            StatusCode::SERVICE_UNAVAILABLE => "service_unavailable",
            StatusCode::BAD_GATEWAY => "upstream_error",
            s if s.is_client_error() => "invalid_request_error",
            _ => "server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "type": self.kind(),
                "code": self.status.as_u16(),
            }
        }));
        (self.status, body).into_response()
    }
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        match &err {
            TtsError::InvalidInput(_) => ApiError::bad_request(err.to_string()),
            TtsError::Unavailable(_) => ApiError::unavailable(err.to_string()),
            TtsError::Remote(_) => ApiError::bad_gateway(err.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
