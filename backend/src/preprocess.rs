use image::imageops::{self, FilterType};
use ndarray::Array4;

use crate::config::PreprocessConfig;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("cannot identify image file: {0}")]
    Decode(#[from] image::ImageError),
    #[error("tensor construction failed: {0}")]
    Tensor(#[from] ndarray::ShapeError),
}

/// A single-image NCHW batch, channel-normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTensor(Array4<f32>);

impl NormalizedTensor {
    /// Backing array in standard (row-major NCHW) layout.
    #[cfg(any(test, feature = "torch"))]
    pub fn as_array(&self) -> &Array4<f32> {
        &self.0
    }
}

/// Decodes `bytes` and produces the tensor the classifier expects.
pub fn preprocess(bytes: &[u8], config: &PreprocessConfig) -> Result<NormalizedTensor, PreprocessError> {
    let mut decoded = image::load_from_memory(bytes)?;

    if let Some([width, height]) = config.initial_resize {
        decoded = decoded.resize_exact(width, height, FilterType::CatmullRom);
    }

    let rgb = decoded.to_rgb8();

    let [width, height] = config.resize;
    let resized = imageops::resize(&rgb, width, height, FilterType::Triangle);

    let crop = config.crop;
    let left = (width - crop) / 2;
    let top = (height - crop) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, crop, crop).to_image();

    let side = crop as usize;
    let plane = side * side;
    let mut data = vec![0f32; 3 * plane];
    for (i, pixel) in cropped.pixels().enumerate() {
        for channel in 0..3 {
            let value = pixel[channel] as f32 / 255.0;
            data[channel * plane + i] = (value - config.mean[channel]) / config.std[channel];
        }
    }

    let tensor = Array4::from_shape_vec((1, 3, side, side), data)?;
    Ok(NormalizedTensor(tensor))
}
