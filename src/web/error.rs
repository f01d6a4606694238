//! Request-boundary error type
//!
//! Validation problems are reported to the caller verbatim. Everything else
//! is logged with its source and replaced by the route's generic message.

use std::error::Error;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub const CALCULATION_FAILED: &str = "Calculation failed";
pub const VISUALIZATION_FAILED: &str = "Visualization generation failed";
pub const EXPORT_FAILED: &str = "Export failed";

#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields (400)
    #[error("{0}")]
    Validation(String),

    /// Any failure past validation (500)
    #[error("{context}: {source}")]
    Failed {
        context: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ApiError {
    pub fn failed(context: &'static str, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        ApiError::Failed {
            context,
            source: source.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Failed { context, source } => {
                error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceError;

    #[test]
    fn test_validation_is_bad_request() {
        let response = ApiError::Validation("points is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_failure_hides_source() {
        let err = ApiError::failed(CALCULATION_FAILED, DistanceError::InsufficientPoints(1));
        assert!(err.to_string().contains("At least 2 points"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
