mod classifier;
mod composer;
mod config;
mod error;
mod export;
mod ingest;
mod metrics;
mod pipeline;
mod preprocess;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;
#[cfg(feature = "torch")]
mod torch_backbone;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use config::{PipelineConfig, ServiceConfig};
use routes::configure_routes;
use state::{AppState, ModelHandle};
use std::sync::Arc;
use store::ResultStore;

fn config_error(e: config::ConfigError) -> std::io::Error {
    log::error!("Invalid configuration: {}", e);
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let service_config = ServiceConfig::from_env().map_err(config_error)?;
    let pipeline = PipelineConfig::load(&service_config.pipeline_config).map_err(config_error)?;

    if pipeline.image.initial_resize.is_none() {
        log::info!("Preprocessing with a single resize and center crop");
    }

    let state = web::Data::new(AppState {
        model: ModelHandle::default(),
        store: ResultStore::new(service_config.result_store_capacity),
        metrics: pipeline.metrics,
        preprocess: Arc::new(pipeline.image),
        inference_timeout: service_config.inference_timeout,
        max_upload_bytes: service_config.max_upload_bytes,
    });

    let bind_address = service_config.bind_address();
    log::info!("Starting server on {}", bind_address);

    let server = HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .wrap(middleware::Logger::default())
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                        .allowed_headers(vec![
                            actix_web::http::header::ACCEPT,
                            actix_web::http::header::CONTENT_TYPE,
                        ])
                        .max_age(3600),
                )
                .app_data(state.clone())
                .configure(configure_routes)
        }
    })
    .bind(&bind_address)?
    .run();

    #[cfg(not(feature = "torch"))]
    log::warn!("Built without the `torch` feature; uploads will answer 503 until rebuilt with it");

    let model_path = service_config.model_path.clone();
    actix_web::rt::spawn(async move {
        log::info!("Loading model from {}", model_path.display());
        let path = model_path.clone();
        match web::block(move || classifier::load_backbone(&path)).await {
            Ok(Ok(backbone)) => {
                state.model.set_ready(classifier::Classifier::new(backbone));
                log::info!("Model ready");
            }
            Ok(Err(e)) => {
                log::error!("Failed to load model {}: {}", model_path.display(), e);
                state.model.set_failed(e.to_string());
            }
            Err(e) => {
                log::error!("Model loading task failed: {}", e);
                state.model.set_failed(e.to_string());
            }
        }
    });

    server.await
}
