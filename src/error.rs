use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to HTTP callers of the prediction endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("JSON must contain 'features' key")]
    MissingFeatures,

    /// features could not be coerced into a numeric matrix
    #[error("{0}")]
    Malformed(String),

    #[error("Expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The detail is logged by the handler and never sent to the client.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

/// Errors raised while loading the model artifact at startup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Model file not found: {0}")]
    NotFound(String),

    #[error("failed to read model file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed model artifact: {0}")]
    Malformed(String),
}
