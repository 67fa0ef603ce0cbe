use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared::ErrorResponse;

use crate::classifier::InferenceError;
use crate::ingest::IngestError;
use crate::preprocess::PreprocessError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Processing error: {0}")]
    Decode(#[from] PreprocessError),
    #[error("Processing error: {0}")]
    Inference(#[from] InferenceError),
    #[error("Processing error: {0}")]
    Internal(String),
    #[error("Model is not ready")]
    NotReady,
    #[error("Missing result_id")]
    MissingResultId,
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ingest(IngestError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Ingest(IngestError::Stream(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ingest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Decode(_) | ApiError::Inference(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::MissingResultId | ApiError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::Ingest(IngestError::Stream(detail)) => format!("Processing error: {}", detail),
            other => other.to_string(),
        };
        if status.is_server_error() {
            log::error!("Error during processing: {:?}", self);
        }
        HttpResponse::build(status).json(ErrorResponse::new(message))
    }
}
