//! Motion-detection pipeline.
//!
//! preprocess → reference → change mask → region extraction, tied together
//! by `MotionDetector`, which also advances the region tracker.

mod config;
mod detector;
mod mask;
mod preprocess;
mod reference;
mod regions;
mod result;

pub use config::{
    DetectorConfig, DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_CYCLE_INTERVAL, DEFAULT_DIFF_THRESHOLD,
    DEFAULT_DILATION_ITERATIONS, DEFAULT_MIN_REGION_AREA,
};
pub use detector::{annotate, MotionDetector, BOX_COLOR, BOX_THICKNESS};
pub use mask::{abs_diff, threshold, ChangeMask, MASK_ON};
pub use preprocess::{auto_sigma, gaussian_kernel, FramePreprocessor};
pub use reference::ReferenceModel;
pub use regions::{Region, RegionExtractor};
pub use result::{BoundingBox, DetectionResult, RegionDelta};
