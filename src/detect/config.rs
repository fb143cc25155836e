use std::time::Duration;

use crate::error::{DetectError, DetectResult};

pub const DEFAULT_BLUR_KERNEL_SIZE: u32 = 21;
pub const DEFAULT_DIFF_THRESHOLD: u8 = 30;
pub const DEFAULT_DILATION_ITERATIONS: u8 = 2;
pub const DEFAULT_MIN_REGION_AREA: u32 = 500;
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables of the detection pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Side of the square Gaussian kernel. Must be odd.
    pub blur_kernel_size: u32,
    /// Per-pixel intensity delta at or above which a pixel counts as changed.
    pub diff_threshold: u8,
    /// 3x3 dilation passes applied to the thresholded mask.
    pub dilation_iterations: u8,
    /// Components with this many mask pixels or fewer are dropped.
    pub min_region_area: u32,
    /// Delay between the end of one cycle and the start of the next.
    pub cycle_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: DEFAULT_BLUR_KERNEL_SIZE,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            dilation_iterations: DEFAULT_DILATION_ITERATIONS,
            min_region_area: DEFAULT_MIN_REGION_AREA,
            cycle_interval: DEFAULT_CYCLE_INTERVAL,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> DetectResult<()> {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(DetectError::InvalidConfig(format!(
                "blur_kernel_size must be a positive odd number, got {}",
                self.blur_kernel_size
            )));
        }
        if self.diff_threshold == 0 {
            return Err(DetectError::InvalidConfig(
                "diff_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.blur_kernel_size, 21);
        assert_eq!(cfg.diff_threshold, 30);
        assert_eq!(cfg.dilation_iterations, 2);
        assert_eq!(cfg.min_region_area, 500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn even_kernel_is_rejected() {
        let cfg = DetectorConfig {
            blur_kernel_size: 20,
            ..DetectorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let cfg = DetectorConfig {
            diff_threshold: 0,
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
