use std::path::Path;

use image::{imageops, imageops::FilterType, DynamicImage};
use ndarray::prelude::*;
use tracing::debug;

use crate::errors::{DetectorError, Result};

/// Side length of the square model input.
pub const IMAGE_SIZE: u32 = 224;

/// A decoded image together with the tensor the models consume.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// NHWC, shape (1, 224, 224, 3), values in [0, 1].
    pub tensor: Array4<f32>,
    /// The image as decoded from disk, for display.
    pub image: DynamicImage,
}

/// Loads and normalizes `path`. Failures are logged and turned into `None`.
pub fn preprocess(path: &Path) -> Option<PreparedImage> {
    match load(path) {
        Ok(prepared) => Some(prepared),
        Err(e) => {
            debug!(path = %path.display(), error = ?e, "preprocessing failed");
            println!("Error preprocessing image: {}", e);
            None
        }
    }
}

pub fn load(path: &Path) -> Result<PreparedImage> {
    let image = image::open(path).map_err(|e| DetectorError::ImageProcessing {
        path: path.display().to_string(),
        operation: "image decode".to_string(),
        source: Box::new(e),
    })?;
    let tensor = to_tensor(&image, IMAGE_SIZE)?;
    debug!(path = %path.display(), width = image.width(), height = image.height(), "image prepared");
    Ok(PreparedImage { tensor, image })
}

/// Resizes to `size` x `size` (aspect ratio is not kept), drops any alpha
/// channel and scales every channel to [0, 1].
pub fn to_tensor(image: &DynamicImage, size: u32) -> Result<Array4<f32>> {
    let rgb = image.to_rgb8();
    let resized = imageops::resize(&rgb, size, size, FilterType::CatmullRom);
    let data = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect::<Vec<_>>();
    Ok(Array4::from_shape_vec(
        (1, size as usize, size as usize, 3),
        data,
    )?)
}
