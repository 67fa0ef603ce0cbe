//! Fixtures shared by the unit tests.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use actix_multipart::Multipart;
use actix_web::error::PayloadError;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::web::{self, Bytes};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use shared::{ResultData, ResultRecord, ValidationResult};

use crate::classifier::{Backbone, Classifier, InferenceError};
use crate::config::PreprocessConfig;
use crate::metrics::MetricsSnapshot;
use crate::preprocess::NormalizedTensor;
use crate::state::{AppState, ModelHandle};
use crate::store::ResultStore;

pub const BOUNDARY: &str = "----sigcheck-test-boundary";

/// Always returns the same logits.
pub struct FixedLogits(pub Vec<f32>);

impl Backbone for FixedLogits {
    fn forward(&self, _input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        Ok(self.0.clone())
    }
}

/// Logits derived from the tensor mean, so output depends on input.
pub struct MeanProbe;

impl Backbone for MeanProbe {
    fn forward(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let mean = input.as_array().mean().unwrap_or(0.0);
        Ok(vec![-mean, mean])
    }
}

pub struct Slow(pub Duration);

impl Backbone for Slow {
    fn forward(&self, _input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        std::thread::sleep(self.0);
        Ok(vec![0.0, 1.0])
    }
}

pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl Part {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            body: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &str, filename: &str, content_type: &str, body: &[u8]) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            body: body.to_vec(),
        }
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = &part.filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.body);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_payload(parts: &[Part]) -> Multipart {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&format!("multipart/form-data; boundary={}", BOUNDARY)).unwrap(),
    );
    let body = Bytes::from(multipart_body(parts));
    let stream = futures::stream::once(async move { Ok::<_, PayloadError>(body) });
    Multipart::new(&headers, stream)
}

pub fn sample_record(result_id: &str, confidence: f64) -> ResultRecord {
    let snapshot = MetricsSnapshot::default();
    ResultRecord {
        success: true,
        message: "Signature processed successfully".into(),
        result_id: result_id.into(),
        data: ResultData {
            validation_result: ValidationResult {
                is_valid: true,
                confidence,
            },
            confusion_matrix: snapshot.confusion_matrix,
            metrics: snapshot.metrics,
            timestamp: 1_700_000_000.25,
        },
    }
}

pub fn app_state(backbone: Arc<dyn Backbone>) -> web::Data<AppState> {
    app_state_with_timeout(backbone, Duration::from_secs(10))
}

pub fn app_state_with_timeout(
    backbone: Arc<dyn Backbone>,
    inference_timeout: Duration,
) -> web::Data<AppState> {
    web::Data::new(AppState {
        model: ModelHandle::ready(Classifier::new(backbone)),
        store: ResultStore::new(None),
        metrics: MetricsSnapshot::default(),
        preprocess: Arc::new(PreprocessConfig::default()),
        inference_timeout,
        max_upload_bytes: 10 * 1024 * 1024,
    })
}
