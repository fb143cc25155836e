use std::collections::BTreeSet;
use std::fmt;

use image::RgbImage;

/// Axis-aligned bounding rectangle of a detected changed region, in pixels.
///
/// Two boxes denote the same region only when all four fields are equal.
/// There is no tolerance and no overlap matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Inclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Inclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height - 1
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

/// How the tracked region table changed in one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionDelta {
    /// Boxes seen this cycle that were not active before.
    pub created: BTreeSet<BoundingBox>,
    /// Boxes active last cycle that were not seen this cycle.
    pub destroyed: BTreeSet<BoundingBox>,
    /// Boxes seen in both cycles.
    pub still_active: BTreeSet<BoundingBox>,
}

impl RegionDelta {
    /// Every box active after this cycle (created ∪ still_active).
    pub fn active(&self) -> impl Iterator<Item = &BoundingBox> {
        self.created.iter().chain(self.still_active.iter())
    }

    pub fn is_quiet(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty() && self.still_active.is_empty()
    }
}

/// Output of one detection cycle.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    /// Source frame with a rectangle drawn around every active box.
    pub annotated_frame: RgbImage,
    pub created: BTreeSet<BoundingBox>,
    pub destroyed: BTreeSet<BoundingBox>,
    pub still_active: BTreeSet<BoundingBox>,
}

impl DetectionResult {
    /// Result for a cycle that produced no detections (e.g. the reference was just set).
    pub fn empty(frame: RgbImage) -> Self {
        Self {
            annotated_frame: frame,
            created: BTreeSet::new(),
            destroyed: BTreeSet::new(),
            still_active: BTreeSet::new(),
        }
    }

    pub(crate) fn from_delta(frame: RgbImage, delta: RegionDelta) -> Self {
        Self {
            annotated_frame: frame,
            created: delta.created,
            destroyed: delta.destroyed,
            still_active: delta.still_active,
        }
    }

    pub fn motion_detected(&self) -> bool {
        !self.created.is_empty() || !self.still_active.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &BoundingBox> {
        self.created.iter().chain(self.still_active.iter())
    }

    /// Split off the region changes, e.g. to hand them to a presentation sink.
    pub fn delta(&self) -> RegionDelta {
        RegionDelta {
            created: self.created.clone(),
            destroyed: self.destroyed.clone(),
            still_active: self.still_active.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_edges_are_inclusive() {
        let b = BoundingBox::new(10, 10, 30, 30);
        assert_eq!(b.right(), 39);
        assert_eq!(b.bottom(), 39);
        assert_eq!(b.area(), 900);
        assert!(b.contains(&BoundingBox::new(10, 10, 30, 30)));
        assert!(!b.contains(&BoundingBox::new(10, 10, 31, 30)));
    }

    #[test]
    fn empty_result_reports_no_motion() {
        let result = DetectionResult::empty(RgbImage::new(2, 2));
        assert!(!result.motion_detected());
        assert!(result.delta().is_quiet());
    }
}
