//! Region identity lifecycle.
//!
//! The tracker keeps one `ActiveRegion` per distinct `BoundingBox` reported in the
//! previous completed cycle. Identity is exact equality of the box: a region that
//! shifts by one pixel is a different region (the old one is destroyed, a new one
//! created). `advance` is the only way entries are added or removed, including at
//! shutdown, so the caller's create/destroy side effects always pair up.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::detect::{BoundingBox, RegionDelta};

/// Tracker-local identifier handed to side effects attached to a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveRegion {
    pub id: RegionId,
    pub bbox: BoundingBox,
    /// Cycle in which this box first appeared.
    pub since_cycle: u64,
}

#[derive(Debug, Default)]
pub struct RegionTracker {
    active: BTreeMap<BoundingBox, ActiveRegion>,
    next_id: u64,
    cycle: u64,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the table with the boxes seen this cycle.
    ///
    /// Afterwards the set of tracked boxes equals `current` exactly.
    pub fn advance(&mut self, current: &BTreeSet<BoundingBox>) -> RegionDelta {
        self.cycle += 1;
        let mut delta = RegionDelta::default();

        let gone: Vec<BoundingBox> = self
            .active
            .keys()
            .filter(|bbox| !current.contains(bbox))
            .copied()
            .collect();
        for bbox in gone {
            if let Some(region) = self.active.remove(&bbox) {
                log::debug!("{} retired at {}", region.id, bbox);
            }
            delta.destroyed.insert(bbox);
        }

        for bbox in current {
            if self.active.contains_key(bbox) {
                delta.still_active.insert(*bbox);
                continue;
            }
            let region = ActiveRegion {
                id: RegionId(self.next_id),
                bbox: *bbox,
                since_cycle: self.cycle,
            };
            self.next_id += 1;
            log::debug!("{} created at {}", region.id, bbox);
            self.active.insert(*bbox, region);
            delta.created.insert(*bbox);
        }

        delta
    }

    /// Retire every active region through the regular `advance` path.
    pub fn retire_all(&mut self) -> RegionDelta {
        self.advance(&BTreeSet::new())
    }

    pub fn get(&self, bbox: &BoundingBox) -> Option<&ActiveRegion> {
        self.active.get(bbox)
    }

    pub fn active(&self) -> impl Iterator<Item = &ActiveRegion> {
        self.active.values()
    }

    pub fn active_boxes(&self) -> BTreeSet<BoundingBox> {
        self.active.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of `advance` calls so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(boxes: &[BoundingBox]) -> BTreeSet<BoundingBox> {
        boxes.iter().copied().collect()
    }

    const A: BoundingBox = BoundingBox::new(10, 10, 30, 30);
    const B: BoundingBox = BoundingBox::new(50, 5, 20, 40);
    const C: BoundingBox = BoundingBox::new(0, 0, 12, 90);

    #[test]
    fn advance_is_idempotent() {
        let mut tracker = RegionTracker::new();
        let boxes = set(&[A, B]);

        let first = tracker.advance(&boxes);
        assert_eq!(first.created, boxes);
        assert!(first.destroyed.is_empty());
        assert!(first.still_active.is_empty());

        let second = tracker.advance(&boxes);
        assert!(second.created.is_empty());
        assert!(second.destroyed.is_empty());
        assert_eq!(second.still_active, boxes);
    }

    #[test]
    fn tracked_set_equals_last_input() {
        let mut tracker = RegionTracker::new();
        for input in [set(&[A]), set(&[A, B]), set(&[C]), set(&[]), set(&[B, C])] {
            tracker.advance(&input);
            assert_eq!(tracker.active_boxes(), input);
        }
    }

    #[test]
    fn shifted_box_is_a_new_region() {
        let mut tracker = RegionTracker::new();
        tracker.advance(&set(&[A]));
        let first_id = tracker.get(&A).unwrap().id;

        let moved = BoundingBox::new(11, 10, 30, 30);
        let delta = tracker.advance(&set(&[moved]));
        assert_eq!(delta.created, set(&[moved]));
        assert_eq!(delta.destroyed, set(&[A]));
        assert_ne!(tracker.get(&moved).unwrap().id, first_id);
    }

    #[test]
    fn identity_survives_while_box_repeats() {
        let mut tracker = RegionTracker::new();
        tracker.advance(&set(&[A]));
        let region = *tracker.get(&A).unwrap();
        tracker.advance(&set(&[A, B]));
        tracker.advance(&set(&[A]));
        assert_eq!(tracker.get(&A), Some(&region));
        assert_eq!(region.since_cycle, 1);
    }

    #[test]
    fn reappearing_box_gets_fresh_identity() {
        let mut tracker = RegionTracker::new();
        tracker.advance(&set(&[A]));
        let old = tracker.get(&A).unwrap().id;
        tracker.advance(&set(&[]));
        let delta = tracker.advance(&set(&[A]));
        assert_eq!(delta.created, set(&[A]));
        assert_ne!(tracker.get(&A).unwrap().id, old);
    }

    #[test]
    fn retire_all_destroys_everything() {
        let mut tracker = RegionTracker::new();
        tracker.advance(&set(&[A, B, C]));
        let delta = tracker.retire_all();
        assert_eq!(delta.destroyed, set(&[A, B, C]));
        assert!(delta.created.is_empty());
        assert!(tracker.is_empty());
    }
}
