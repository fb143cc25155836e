use image::{imageops, GrayImage};
use imageproc::filter::separable_filter_equal;

use crate::error::DetectResult;
use crate::frame::{check_dimensions, ColorFrame};

/// Converts color frames into smoothed intensity frames ready for differencing.
#[derive(Clone, Debug)]
pub struct FramePreprocessor {
    kernel: Vec<f32>,
}

impl FramePreprocessor {
    /// `kernel_size` must be odd; sigma is derived from it.
    pub fn new(kernel_size: u32) -> Self {
        Self {
            kernel: gaussian_kernel(kernel_size, auto_sigma(kernel_size)),
        }
    }

    pub fn kernel(&self) -> &[f32] {
        &self.kernel
    }

    pub fn process(&self, frame: &ColorFrame) -> DetectResult<GrayImage> {
        check_dimensions(frame.width(), frame.height())?;
        let gray = imageops::grayscale(frame.image());
        if self.kernel.len() <= 1 {
            return Ok(gray);
        }
        Ok(separable_filter_equal(&gray, &self.kernel))
    }
}

/// Sigma used when a Gaussian is requested by kernel size alone.
pub fn auto_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights of the given odd length.
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0];
    }
    let center = (size / 2) as f32;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / denom).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}
