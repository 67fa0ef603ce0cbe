use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::preprocess::NormalizedTensor;

/// Class index the model assigns to genuine signatures.
pub const GENUINE_LABEL: usize = 1;
const NUM_CLASSES: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} logits, model returned {actual}")]
    Shape { expected: usize, actual: usize },
    #[error("model returned non-finite logits")]
    NonFinite,
    #[error("{0}")]
    Backend(String),
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// A loaded network: one forward pass from a normalized batch to raw logits.
pub trait Backbone: Send + Sync {
    fn forward(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationOutcome {
    pub label: usize,
    /// Probability of `label` as a percentage, unrounded.
    pub confidence_percent: f64,
}

impl ClassificationOutcome {
    pub fn is_valid(&self) -> bool {
        self.label == GENUINE_LABEL
    }
}

#[derive(Clone)]
pub struct Classifier {
    backbone: Arc<dyn Backbone>,
}

impl Classifier {
    pub fn new(backbone: Arc<dyn Backbone>) -> Self {
        Self { backbone }
    }

    pub fn classify(&self, input: &NormalizedTensor) -> Result<ClassificationOutcome, InferenceError> {
        let logits = self.backbone.forward(input)?;
        outcome_from_logits(&logits)
    }
}

pub fn outcome_from_logits(logits: &[f32]) -> Result<ClassificationOutcome, InferenceError> {
    if logits.len() != NUM_CLASSES {
        return Err(InferenceError::Shape {
            expected: NUM_CLASSES,
            actual: logits.len(),
        });
    }
    if logits.iter().any(|v| !v.is_finite()) {
        return Err(InferenceError::NonFinite);
    }

    let probabilities = softmax(logits);

    // Ties keep the lower index.
    let (label, probability) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    Ok(ClassificationOutcome {
        label,
        confidence_percent: f64::from(probability) * 100.0,
    })
}

/// Single-precision softmax, matching the model's float32 output head.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Loads the pretrained network from `path`.
#[cfg(feature = "torch")]
pub fn load_backbone(path: &Path) -> Result<Arc<dyn Backbone>, InferenceError> {
    let backbone = crate::torch_backbone::TorchBackbone::load(path)?;
    Ok(Arc::new(backbone))
}

#[cfg(not(feature = "torch"))]
pub fn load_backbone(path: &Path) -> Result<Arc<dyn Backbone>, InferenceError> {
    Err(InferenceError::Unavailable(format!(
        "cannot load {}: built without the `torch` feature",
        path.display()
    )))
}
