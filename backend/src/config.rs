use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::metrics::{MetricsConfig, MetricsSnapshot};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MODEL_PATH: &str = "models/signature_classifier.pt";
const DEFAULT_PIPELINE_CONFIG: &str = "config/pipeline.yaml";
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
    #[error("Failed to read pipeline config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse pipeline config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid preprocessing config: {0}")]
    Invalid(String),
}

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub pipeline_config: PathBuf,
    pub inference_timeout: Duration,
    pub max_upload_bytes: usize,
    pub result_store_capacity: Option<usize>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
        let timeout_secs =
            parse_var(&lookup, "INFERENCE_TIMEOUT_SECS")?.unwrap_or(DEFAULT_INFERENCE_TIMEOUT_SECS);
        let max_upload_bytes =
            parse_var(&lookup, "MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        let result_store_capacity = parse_var::<usize, _>(&lookup, "RESULT_STORE_CAPACITY")?;

        if result_store_capacity == Some(0) {
            return Err(ConfigError::InvalidVar {
                name: "RESULT_STORE_CAPACITY",
                value: "0".into(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            model_path: lookup("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string())
                .into(),
            pipeline_config: lookup("PIPELINE_CONFIG")
                .unwrap_or_else(|| DEFAULT_PIPELINE_CONFIG.to_string())
                .into(),
            inference_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes,
            result_store_capacity,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

/// Geometry and normalization applied to every upload before inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// First square resize applied straight after decoding. `None` collapses
    /// the pipeline to a single resize and crop.
    pub initial_resize: Option<[u32; 2]>,
    pub resize: [u32; 2],
    pub crop: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            initial_resize: Some([224, 224]),
            resize: [256, 256],
            crop: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some([w, h]) = self.initial_resize {
            if w == 0 || h == 0 {
                return Err(ConfigError::Invalid("initial_resize must be non-zero".into()));
            }
        }
        let [w, h] = self.resize;
        if w == 0 || h == 0 || self.crop == 0 {
            return Err(ConfigError::Invalid("resize and crop must be non-zero".into()));
        }
        if self.crop > w || self.crop > h {
            return Err(ConfigError::Invalid(format!(
                "crop {} exceeds resize {}x{}",
                self.crop, w, h
            )));
        }
        if self.std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ConfigError::Invalid("std values must be finite and non-zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PipelineFile {
    image: PreprocessConfig,
    metrics: Option<MetricsConfig>,
}

/// Contents of the optional pipeline YAML file.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub image: PreprocessConfig,
    pub metrics: MetricsSnapshot,
}

impl PipelineConfig {
    /// Loads the YAML file at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!(
                "No pipeline config at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let file: PipelineFile = serde_yaml::from_str(contents)?;
        file.image.validate()?;

        let metrics = file
            .metrics
            .map(MetricsSnapshot::from)
            .unwrap_or_default();

        Ok(Self {
            image: file.image,
            metrics,
        })
    }
}
