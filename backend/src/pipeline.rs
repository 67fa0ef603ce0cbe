use actix_web::web;
use shared::ResultRecord;

use crate::classifier::InferenceError;
use crate::composer::compose;
use crate::error::ApiError;
use crate::ingest::UploadedImage;
use crate::preprocess::preprocess;
use crate::state::AppState;

/// Preprocess, classify, compose and store one validated upload.
pub async fn process_upload(state: &AppState, upload: UploadedImage) -> Result<ResultRecord, ApiError> {
    let classifier = state.model.classifier().ok_or(ApiError::NotReady)?;
    let config = state.preprocess.clone();
    let timeout = state.inference_timeout;
    log::debug!(
        "Processing {} ({}, {} bytes)",
        upload.filename,
        upload.content_type,
        upload.bytes.len()
    );
    let bytes = upload.bytes;

    let job = web::block(move || -> Result<_, ApiError> {
        let tensor = preprocess(&bytes, &config)?;
        Ok(classifier.classify(&tensor)?)
    });

    let outcome = match tokio::time::timeout(timeout, job).await {
        Err(_) => return Err(InferenceError::Timeout(timeout).into()),
        Ok(Err(blocking)) => return Err(ApiError::Internal(blocking.to_string())),
        Ok(Ok(result)) => result?,
    };

    let record = compose(&outcome, &state.metrics);
    state.store.put(record.result_id.clone(), record.clone());

    log::info!(
        "Result generated: {} - Valid: {}, Confidence: {:.4}%",
        record.result_id,
        record.data.validation_result.is_valid,
        outcome.confidence_percent
    );
    Ok(record)
}
