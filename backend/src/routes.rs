use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use shared::{ExportFormat, HealthResponse, ModelState};

use crate::error::ApiError;
use crate::export;
use crate::ingest::{read_upload, select_image};
use crate::pipeline::process_upload;
use crate::state::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/upload-signature").route(web::post().to(upload_signature)))
        .service(web::resource("/api/result/{result_id}").route(web::get().to(get_result)))
        .service(web::resource("/api/export").route(web::get().to(export_result)))
        .service(web::resource("/api/health").route(web::get().to(health)));
}

async fn upload_signature(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    log::info!("New signature upload request");

    let multipart = Multipart::new(req.headers(), payload);
    let form = read_upload(multipart, state.max_upload_bytes).await?;
    let upload = select_image(form)?;

    let record = process_upload(&state, upload).await?;
    Ok(HttpResponse::Ok().json(record))
}

async fn get_result(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let result_id = path.into_inner();
    let record = state.store.get(&result_id)?;
    log::info!("Retrieved result: {}", result_id);
    Ok(HttpResponse::Ok().json(record))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
    result_id: Option<String>,
}

async fn export_result(
    state: web::Data<AppState>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse, ApiError> {
    let ExportQuery { format, result_id } = query.into_inner();

    let format = match format {
        None => ExportFormat::Json,
        Some(raw) => ExportFormat::from_str(&raw).map_err(|_| ApiError::UnsupportedFormat(raw))?,
    };
    let result_id = result_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingResultId)?;

    let record = state.store.get(&result_id)?;
    let body = export::render(&record, format).map_err(|e| ApiError::Internal(e.to_string()))?;

    log::info!("Exporting result {} as {}", result_id, format);
    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(format!(
                "signature-analysis.{}",
                format.extension()
            ))],
        })
        .body(body))
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    let (status, error) = state.model.state();
    let body = HealthResponse {
        status,
        model_loaded: status == ModelState::Ready,
        stored_results: state.store.len(),
        error,
    };

    if status == ModelState::Ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
