//! Alert labels attached to active regions.
//!
//! `AnnotationBoard` is the reference presentation sink: it materializes one
//! label per created region and tears it down when the region is destroyed, so
//! its label set mirrors the tracker's active set after every dispatch.

use std::collections::BTreeMap;

use crate::cycle::PresentationSink;
use crate::detect::{BoundingBox, DetectionResult};
use crate::track::{ActiveRegion, RegionId};

pub const MOTION_LABEL_TEXT: &str = "Motion Detected!";
/// Labels sit this many pixels above their box.
pub const LABEL_OFFSET_Y: u32 = 20;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionLabel {
    pub region: RegionId,
    pub text: &'static str,
    pub x: u32,
    pub y: u32,
}

impl MotionLabel {
    pub fn for_region(region: &ActiveRegion) -> Self {
        Self {
            region: region.id,
            text: MOTION_LABEL_TEXT,
            x: region.bbox.x,
            y: region.bbox.y.saturating_sub(LABEL_OFFSET_Y),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnnotationBoard {
    labels: BTreeMap<BoundingBox, MotionLabel>,
    alerts_raised: u64,
    frames_rendered: u64,
}

impl AnnotationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&self, bbox: &BoundingBox) -> Option<&MotionLabel> {
        self.labels.get(bbox)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&BoundingBox, &MotionLabel)> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels ever created.
    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl PresentationSink for AnnotationBoard {
    fn region_created(&mut self, region: &ActiveRegion) {
        self.labels
            .insert(region.bbox, MotionLabel::for_region(region));
        self.alerts_raised += 1;
    }

    fn region_destroyed(&mut self, bbox: &BoundingBox) {
        self.labels.remove(bbox);
    }

    fn render(&mut self, _result: &DetectionResult) {
        self.frames_rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_placed_above_box() {
        let region = ActiveRegion {
            id: RegionId(3),
            bbox: BoundingBox::new(40, 50, 10, 10),
            since_cycle: 1,
        };
        let label = MotionLabel::for_region(&region);
        assert_eq!((label.x, label.y), (40, 30));
        assert_eq!(label.text, MOTION_LABEL_TEXT);
        assert_eq!(label.region, RegionId(3));
    }

    #[test]
    fn label_clamps_at_top_edge() {
        let region = ActiveRegion {
            id: RegionId(0),
            bbox: BoundingBox::new(5, 8, 10, 10),
            since_cycle: 1,
        };
        assert_eq!(MotionLabel::for_region(&region).y, 0);
    }

    #[test]
    fn destroy_removes_label() {
        let mut board = AnnotationBoard::new();
        let region = ActiveRegion {
            id: RegionId(0),
            bbox: BoundingBox::new(1, 30, 4, 4),
            since_cycle: 1,
        };
        board.region_created(&region);
        assert_eq!(board.len(), 1);
        board.region_destroyed(&region.bbox);
        assert!(board.is_empty());
        assert_eq!(board.alerts_raised(), 1);
    }
}
