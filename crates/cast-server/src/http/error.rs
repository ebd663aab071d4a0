//! Admin API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use cast_control::ControlError;

/// Failure of an admin API call, rendered as `{"error": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Control plane request failed: {0}")]
    Remote(#[from] ControlError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Remote(ControlError::InvalidMode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_core::ForwardingMode;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Remote(ControlError::Rejected { status: 500 }).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Remote(ControlError::InvalidMode(ForwardingMode::Unknown)).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
