//! Motion Watch
//!
//! Frame-differencing motion detection with a region identity lifecycle.
//!
//! # Architecture
//!
//! Each cycle pulls one color frame and runs it through:
//!
//! 1. **Preprocess**: grayscale, then a fixed-size Gaussian blur.
//! 2. **Reference**: the previous preprocessed frame is the baseline; it is replaced every cycle.
//! 3. **Change mask**: absolute difference, binary threshold, dilation.
//! 4. **Regions**: outermost connected components above a pixel-area floor, as bounding boxes.
//! 5. **Tracking**: boxes are matched to active regions by exact equality; the caller
//!    gets `created` / `destroyed` / `still_active` sets to drive its side effects.
//!
//! # Module Structure
//!
//! - `frame`: Color frames and pixel-format normalization
//! - `detect`: Pipeline stages and `MotionDetector::feed`
//! - `track`: `RegionTracker` and region identities
//! - `cycle`: `DetectionLoop`, `PresentationSink`
//! - `annotate`: `AnnotationBoard`, the reference sink
//! - `ingest`: Frame sources (synthetic, image sequences)
//! - `config`: `motiond` configuration

pub mod annotate;
pub mod config;
pub mod cycle;
pub mod detect;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod track;

pub use annotate::{AnnotationBoard, MotionLabel, MOTION_LABEL_TEXT};
pub use cycle::{
    dispatch_delta, DetectionLoop, LoopStats, PresentationSink, StopReason, TickOutcome,
};
pub use detect::{
    BoundingBox, ChangeMask, DetectionResult, DetectorConfig, FramePreprocessor, MotionDetector,
    ReferenceModel, Region, RegionDelta, RegionExtractor,
};
pub use error::{DetectError, DetectResult};
pub use frame::{ColorFrame, PixelFormat};
pub use ingest::{open_source, FrameSource, ImageSequenceSource, SyntheticConfig, SyntheticSource};
pub use track::{ActiveRegion, RegionId, RegionTracker};
