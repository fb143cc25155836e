//! Detection loop: acquire → detect → dispatch → wait, one cycle at a time.
//!
//! A cycle always runs to completion before the next starts. Per-cycle faults
//! (missing frame, bad frame, size change) skip that tick only; nothing here
//! stops the loop except the stop flag, an exhausted source, or a cycle cap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::detect::{BoundingBox, DetectionResult, DetectorConfig, MotionDetector, RegionDelta};
use crate::error::{DetectError, DetectResult};
use crate::ingest::FrameSource;
use crate::track::{ActiveRegion, RegionTracker};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Receives detection output and owns every presentation side effect.
pub trait PresentationSink {
    /// A region appeared; attach its side effect.
    fn region_created(&mut self, region: &ActiveRegion);

    /// A region went quiet; tear its side effect down.
    fn region_destroyed(&mut self, bbox: &BoundingBox);

    /// Show the annotated frame of a completed cycle.
    fn render(&mut self, _result: &DetectionResult) {}
}

impl<P: PresentationSink + ?Sized> PresentationSink for &mut P {
    fn region_created(&mut self, region: &ActiveRegion) {
        (**self).region_created(region)
    }

    fn region_destroyed(&mut self, bbox: &BoundingBox) {
        (**self).region_destroyed(bbox)
    }

    fn render(&mut self, result: &DetectionResult) {
        (**self).render(result)
    }
}

/// Forward a region delta to the sink: teardown first, then creation.
///
/// Used for regular cycles and for shutdown alike.
pub fn dispatch_delta<P: PresentationSink + ?Sized>(
    sink: &mut P,
    tracker: &RegionTracker,
    delta: &RegionDelta,
) {
    for bbox in &delta.destroyed {
        sink.region_destroyed(bbox);
    }
    for bbox in &delta.created {
        match tracker.get(bbox) {
            Some(region) => sink.region_created(region),
            None => log::warn!("created box {} missing from tracker", bbox),
        }
    }
}

/// What a single tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source had no frame ready.
    NoFrame,
    /// First usable frame: stored as the reference, nothing reported.
    Seeded,
    /// A full pass completed.
    Detected {
        created: usize,
        destroyed: usize,
        active: usize,
    },
    /// The frame was rejected; the tick was skipped.
    Skipped(DetectError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub frames_processed: u64,
    pub acquisition_misses: u64,
    pub skipped: u64,
    pub regions_created: u64,
    pub regions_destroyed: u64,
}

/// Why `run` returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    SourceExhausted,
    CycleLimit,
}

pub struct DetectionLoop<S, P> {
    source: S,
    sink: P,
    detector: MotionDetector,
    interval: Duration,
    stats: LoopStats,
}

impl<S: FrameSource, P: PresentationSink> DetectionLoop<S, P> {
    pub fn new(source: S, sink: P, config: DetectorConfig) -> DetectResult<Self> {
        let interval = config.cycle_interval;
        Ok(Self {
            source,
            sink,
            detector: MotionDetector::new(config)?,
            interval,
            stats: LoopStats::default(),
        })
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, P, LoopStats) {
        (self.source, self.sink, self.stats)
    }

    /// Run exactly one cycle.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.cycles += 1;

        let Some(frame) = self.source.next_frame() else {
            self.stats.acquisition_misses += 1;
            log::trace!("cycle {}: no frame", self.stats.cycles);
            return TickOutcome::NoFrame;
        };

        let seeding = !self.detector.has_reference();
        let result = match self.detector.feed(&frame) {
            Ok(result) => result,
            Err(err) => {
                self.stats.skipped += 1;
                log::warn!("cycle {} skipped: {}", self.stats.cycles, err);
                return TickOutcome::Skipped(err);
            }
        };
        self.stats.frames_processed += 1;

        let delta = result.delta();
        dispatch_delta(&mut self.sink, self.detector.tracker(), &delta);
        self.sink.render(&result);

        if seeding {
            return TickOutcome::Seeded;
        }
        self.stats.regions_created += delta.created.len() as u64;
        self.stats.regions_destroyed += delta.destroyed.len() as u64;
        TickOutcome::Detected {
            created: delta.created.len(),
            destroyed: delta.destroyed.len(),
            active: self.detector.tracker().len(),
        }
    }

    /// Tick, wait `interval`, repeat until stopped; then shut down.
    pub fn run(&mut self, stop: &AtomicBool, max_cycles: Option<u64>) -> StopReason {
        let mut last_health_log = Instant::now();
        log::info!(
            "detection loop running on {} (interval {:?})",
            self.source.describe(),
            self.interval
        );

        let reason = loop {
            if stop.load(Ordering::SeqCst) {
                break StopReason::Requested;
            }
            if self.source.is_exhausted() {
                break StopReason::SourceExhausted;
            }
            if max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                break StopReason::CycleLimit;
            }

            self.tick();

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                log::info!(
                    "health: cycles={} frames={} misses={} skipped={} active={}",
                    self.stats.cycles,
                    self.stats.frames_processed,
                    self.stats.acquisition_misses,
                    self.stats.skipped,
                    self.detector.tracker().len()
                );
                last_health_log = Instant::now();
            }

            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        };

        let retired = self.shutdown();
        log::info!("detection loop stopped ({:?}); retired {} regions", reason, retired);
        reason
    }

    /// Retire every active region and notify the sink through `dispatch_delta`.
    pub fn shutdown(&mut self) -> usize {
        let delta = self.detector.shutdown();
        dispatch_delta(&mut self.sink, self.detector.tracker(), &delta);
        self.stats.regions_destroyed += delta.destroyed.len() as u64;
        delta.destroyed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::AnnotationBoard;
    use crate::frame::ColorFrame;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    struct ScriptedSource {
        frames: VecDeque<Option<ColorFrame>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Option<RgbImage>>) -> Self {
            Self {
                frames: frames
                    .into_iter()
                    .enumerate()
                    .map(|(i, f)| f.map(|img| ColorFrame::from_image(img, i as u64).unwrap()))
                    .collect(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn next_frame(&mut self) -> Option<ColorFrame> {
            self.frames.pop_front().flatten()
        }

        fn is_exhausted(&self) -> bool {
            self.frames.is_empty()
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn blank() -> RgbImage {
        RgbImage::new(100, 100)
    }

    fn with_square() -> RgbImage {
        let mut img = blank();
        for y in 10..40 {
            for x in 10..40 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        img
    }

    fn config() -> DetectorConfig {
        DetectorConfig {
            cycle_interval: Duration::ZERO,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn missing_frame_skips_tick() {
        let source = ScriptedSource::new(vec![None, Some(blank())]);
        let mut lp = DetectionLoop::new(source, AnnotationBoard::new(), config()).unwrap();
        assert_eq!(lp.tick(), TickOutcome::NoFrame);
        assert_eq!(lp.tick(), TickOutcome::Seeded);
        assert_eq!(lp.stats().acquisition_misses, 1);
        assert_eq!(lp.stats().frames_processed, 1);
    }

    #[test]
    fn board_follows_region_lifecycle() {
        let source = ScriptedSource::new(vec![
            Some(blank()),
            Some(with_square()),
            Some(blank()),
            Some(blank()),
        ]);
        let mut lp = DetectionLoop::new(source, AnnotationBoard::new(), config()).unwrap();

        lp.tick();
        match lp.tick() {
            TickOutcome::Detected {
                created, destroyed, ..
            } => {
                assert_eq!(created, 1);
                assert_eq!(destroyed, 0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(lp.sink().len(), 1);
        assert_eq!(lp.sink().len(), lp.detector().tracker().len());

        // Square vanishing differs from the reference by the same pixels, so the
        // box is seen once more before it goes quiet.
        assert!(matches!(lp.tick(), TickOutcome::Detected { active: 1, .. }));
        assert_eq!(lp.sink().len(), 1);

        lp.tick();
        assert!(lp.sink().is_empty());
        assert_eq!(lp.stats().regions_created, 1);
        assert_eq!(lp.stats().regions_destroyed, 1);
    }

    #[test]
    fn size_change_is_skipped_not_fatal() {
        let source = ScriptedSource::new(vec![
            Some(blank()),
            Some(RgbImage::new(50, 50)),
            Some(RgbImage::new(50, 50)),
        ]);
        let mut lp = DetectionLoop::new(source, AnnotationBoard::new(), config()).unwrap();
        lp.tick();
        assert!(matches!(
            lp.tick(),
            TickOutcome::Skipped(DetectError::DimensionMismatch { .. })
        ));
        assert!(matches!(lp.tick(), TickOutcome::Detected { .. }));
        assert_eq!(lp.stats().skipped, 1);
    }

    #[test]
    fn stop_retires_regions_through_sink() {
        let source = ScriptedSource::new(vec![Some(blank()), Some(with_square())]);
        let mut lp = DetectionLoop::new(source, AnnotationBoard::new(), config()).unwrap();
        let stop = AtomicBool::new(false);

        let reason = lp.run(&stop, None);
        assert_eq!(reason, StopReason::SourceExhausted);
        assert!(lp.sink().is_empty());
        assert_eq!(lp.sink().alerts_raised(), 1);
        assert!(lp.detector().tracker().is_empty());
    }

    #[test]
    fn stop_flag_and_cycle_cap_end_run() {
        let frames = (0..10).map(|_| Some(blank())).collect();
        let mut lp =
            DetectionLoop::new(ScriptedSource::new(frames), AnnotationBoard::new(), config())
                .unwrap();
        assert_eq!(lp.run(&AtomicBool::new(false), Some(3)), StopReason::CycleLimit);
        assert_eq!(lp.stats().cycles, 3);
        assert_eq!(lp.run(&AtomicBool::new(true), None), StopReason::Requested);
        assert_eq!(lp.stats().cycles, 3);
    }
}
