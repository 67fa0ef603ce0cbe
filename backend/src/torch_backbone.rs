use std::path::Path;
use std::sync::Mutex;

use tch::{CModule, Device, Kind, TchError, Tensor};

use crate::classifier::{Backbone, InferenceError};
use crate::preprocess::NormalizedTensor;

impl From<TchError> for InferenceError {
    fn from(err: TchError) -> Self {
        InferenceError::Backend(err.to_string())
    }
}

/// TorchScript export of the two-class signature model.
pub struct TorchBackbone {
    module: Mutex<CModule>,
    device: Device,
}

impl TorchBackbone {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let device = Device::cuda_if_available();
        log::info!("Loading TorchScript model from {} on {:?}", path.display(), device);

        let mut module = CModule::load_on_device(path, device)?;
        module.set_eval();

        Ok(Self {
            module: Mutex::new(module),
            device,
        })
    }
}

impl Backbone for TorchBackbone {
    fn forward(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let array = input.as_array();
        let shape: Vec<i64> = array.shape().iter().map(|d| *d as i64).collect();
        let data = array
            .as_slice()
            .ok_or_else(|| InferenceError::Backend("input tensor is not contiguous".into()))?;
        let tensor = Tensor::f_from_slice(data)?
            .f_view(shape.as_slice())?
            .to_device(self.device);

        let module = self
            .module
            .lock()
            .map_err(|_| InferenceError::Backend("model lock poisoned".into()))?;
        let output = tch::no_grad(|| module.forward_ts(&[tensor]))?;

        let flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        let numel = flat.numel();
        let mut logits = vec![0f32; numel];
        flat.f_copy_data(&mut logits, numel)?;
        Ok(logits)
    }
}
