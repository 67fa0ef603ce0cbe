use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use shared::ModelState;

use crate::classifier::Classifier;
use crate::config::PreprocessConfig;
use crate::metrics::MetricsSnapshot;
use crate::store::ResultStore;

enum ModelStatus {
    Loading,
    Ready(Classifier),
    Failed(String),
}

/// Readiness-aware slot for the classifier, filled once the model loads.
pub struct ModelHandle {
    status: RwLock<ModelStatus>,
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self {
            status: RwLock::new(ModelStatus::Loading),
        }
    }
}

impl ModelHandle {
    #[cfg(test)]
    pub fn ready(classifier: Classifier) -> Self {
        Self {
            status: RwLock::new(ModelStatus::Ready(classifier)),
        }
    }

    pub fn set_ready(&self, classifier: Classifier) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = ModelStatus::Ready(classifier);
    }

    pub fn set_failed(&self, reason: String) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = ModelStatus::Failed(reason);
    }

    /// The loaded classifier, or `None` while loading or after a failed load.
    pub fn classifier(&self) -> Option<Classifier> {
        match &*self.status.read().unwrap_or_else(PoisonError::into_inner) {
            ModelStatus::Ready(classifier) => Some(classifier.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> (ModelState, Option<String>) {
        match &*self.status.read().unwrap_or_else(PoisonError::into_inner) {
            ModelStatus::Loading => (ModelState::Loading, None),
            ModelStatus::Ready(_) => (ModelState::Ready, None),
            ModelStatus::Failed(reason) => (ModelState::Failed, Some(reason.clone())),
        }
    }
}

/// Everything a request handler needs, shared across workers.
pub struct AppState {
    pub model: ModelHandle,
    pub store: ResultStore,
    pub metrics: MetricsSnapshot,
    pub preprocess: Arc<PreprocessConfig>,
    pub inference_timeout: Duration,
    pub max_upload_bytes: usize,
}
