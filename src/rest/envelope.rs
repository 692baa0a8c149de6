// rest/envelope.rs — Uniform response envelope + error mapping.
//
// Every task/tag endpoint answers `{statusCode, message, data}`, success and
// error alike; `data` is omitted for pure-status responses. The HTTP status
// always equals the envelope's statusCode.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// 200 with payload.
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: Some(data),
        })
    }

    /// 200 without payload.
    pub fn ok_empty(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status_code: StatusCode::OK.as_u16(),
            message: message.into(),
            data: None,
        })
    }
}

/// Handler result: a 200 envelope or an [`ApiError`] rendered as one.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// The three error kinds every handler maps to. One propagation policy for
/// all of them: the full error chain is logged here, the client gets the
/// envelope with a message safe to expose.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage failure")]
    Persistence(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Persistence(ref e) = self {
            // Full detail stays server-side; the client sees the generic message.
            error!(err = ?e, "storage operation failed");
        }
        let status = self.status();
        let body = Envelope::<()> {
            status_code: status.as_u16(),
            message: self.to_string(),
            data: None,
        };
        (status, Json(body)).into_response()
    }
}
