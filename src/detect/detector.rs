use std::collections::BTreeSet;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::config::DetectorConfig;
use super::mask::ChangeMask;
use super::preprocess::FramePreprocessor;
use super::reference::ReferenceModel;
use super::regions::RegionExtractor;
use super::result::{BoundingBox, DetectionResult, RegionDelta};
use crate::error::{DetectError, DetectResult};
use crate::frame::ColorFrame;
use crate::track::RegionTracker;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;

/// Frame-differencing motion detector.
///
/// Owns the reference frame and the region table; both change only inside
/// `feed` and `shutdown`.
#[derive(Debug)]
pub struct MotionDetector {
    config: DetectorConfig,
    preprocessor: FramePreprocessor,
    mask: ChangeMask,
    extractor: RegionExtractor,
    reference: ReferenceModel,
    tracker: RegionTracker,
}

impl MotionDetector {
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self {
            preprocessor: FramePreprocessor::new(config.blur_kernel_size),
            mask: ChangeMask::new(config.diff_threshold, config.dilation_iterations),
            extractor: RegionExtractor::new(config.min_region_area),
            reference: ReferenceModel::new(),
            tracker: RegionTracker::new(),
            config,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn tracker(&self) -> &RegionTracker {
        &self.tracker
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_initialized()
    }

    /// Run one detection pass over `frame`.
    ///
    /// The first frame only seeds the reference and yields an empty result. A frame
    /// whose size differs from the reference returns `DimensionMismatch` and becomes
    /// the new reference; the region table is left as it was.
    pub fn feed(&mut self, frame: &ColorFrame) -> DetectResult<DetectionResult> {
        let gray = self.preprocessor.process(frame)?;

        let mask = match self
            .reference
            .get()
            .map(|reference| self.mask.compute(&gray, reference))
        {
            None => {
                log::debug!(
                    "reference initialized from frame {} ({}x{})",
                    frame.sequence,
                    gray.width(),
                    gray.height()
                );
                self.reference.update(gray);
                return Ok(DetectionResult::empty(frame.to_image()));
            }
            Some(Err(err @ DetectError::DimensionMismatch { .. })) => {
                log::warn!("{}; resetting reference", err);
                self.reference.update(gray);
                return Err(err);
            }
            Some(Err(err)) => return Err(err),
            Some(Ok(mask)) => mask,
        };

        let boxes: BTreeSet<BoundingBox> = self.extractor.extract(&mask).into_iter().collect();
        let delta = self.tracker.advance(&boxes);
        let annotated = annotate(frame.to_image(), delta.active());
        self.reference.update(gray);

        Ok(DetectionResult::from_delta(annotated, delta))
    }

    /// Retire every active region through the same path `feed` uses.
    pub fn shutdown(&mut self) -> RegionDelta {
        self.tracker.retire_all()
    }

    /// Forget the reference so the next frame starts a fresh baseline.
    pub fn reset_reference(&mut self) {
        self.reference.clear();
    }
}

/// Draw a `BOX_THICKNESS` rectangle around each box, growing outward.
pub fn annotate<'a>(
    mut image: RgbImage,
    boxes: impl IntoIterator<Item = &'a BoundingBox>,
) -> RgbImage {
    for bbox in boxes {
        for grow in 0..BOX_THICKNESS {
            let rect = Rect::at(bbox.x as i32 - grow as i32, bbox.y as i32 - grow as i32)
                .of_size(bbox.width + 2 * grow, bbox.height + 2 * grow);
            draw_hollow_rect_mut(&mut image, rect, BOX_COLOR);
        }
    }
    image
}
