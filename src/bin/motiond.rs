//! motiond - motion watch daemon
//!
//! This daemon:
//! 1. Pulls frames from the configured source (synthetic or image sequence)
//! 2. Runs the detector once per cycle, then waits the configured interval
//! 3. Raises a "Motion Detected!" alert per new region and clears it when the region goes quiet
//! 4. Optionally writes annotated frames to a snapshot directory
//! 5. Retires every open alert on Ctrl-C before exiting

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use motion_watch::config::{MotiondConfig, SnapshotSettings};
use motion_watch::{
    open_source, ActiveRegion, AnnotationBoard, BoundingBox, DetectionLoop, DetectionResult,
    PresentationSink,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (JSON, or TOML with a .toml extension).
    #[arg(long, env = "MOTION_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source: stub://<name> or a directory of images.
    #[arg(long)]
    source: Option<String>,
    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,
    /// Directory for annotated snapshots.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Write every n-th rendered frame to the snapshot directory.
    #[arg(long)]
    snapshot_every: Option<u64>,
}

/// Alert board that also logs alerts and writes periodic snapshots.
struct AlertSink {
    board: AnnotationBoard,
    snapshots: Option<SnapshotSettings>,
}

impl AlertSink {
    fn write_snapshot(&self, settings: &SnapshotSettings, result: &DetectionResult) {
        let frame_no = self.board.frames_rendered();
        if frame_no % settings.every != 0 {
            return;
        }
        let path = settings.dir.join(format!("frame_{:08}.png", frame_no));
        if let Err(e) = result.annotated_frame.save(&path) {
            log::warn!("snapshot {} failed: {}", path.display(), e);
        }
    }
}

impl PresentationSink for AlertSink {
    fn region_created(&mut self, region: &ActiveRegion) {
        self.board.region_created(region);
        if let Some(label) = self.board.label(&region.bbox) {
            log::warn!(
                "{} {} at {} (label at {},{})",
                label.text,
                region.id,
                region.bbox,
                label.x,
                label.y
            );
        }
    }

    fn region_destroyed(&mut self, bbox: &BoundingBox) {
        if let Some(label) = self.board.label(bbox) {
            log::info!("{} at {} cleared", label.region, bbox);
        }
        self.board.region_destroyed(bbox);
    }

    fn render(&mut self, result: &DetectionResult) {
        self.board.render(result);
        if let Some(settings) = &self.snapshots {
            self.write_snapshot(settings, result);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = MotiondConfig::load_from(args.config.as_deref())?;
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if args.max_cycles.is_some() {
        cfg.max_cycles = args.max_cycles;
    }
    if let Some(dir) = args.snapshot_dir {
        let every = args
            .snapshot_every
            .or(cfg.snapshots.as_ref().map(|s| s.every))
            .unwrap_or(1);
        cfg.snapshots = Some(SnapshotSettings { dir, every });
    }
    cfg.validate()?;

    if let Some(snapshots) = &cfg.snapshots {
        std::fs::create_dir_all(&snapshots.dir).map_err(|e| {
            anyhow!(
                "failed to create snapshot dir {}: {}",
                snapshots.dir.display(),
                e
            )
        })?;
        log::info!(
            "writing every {} annotated frame(s) to {}",
            snapshots.every,
            snapshots.dir.display()
        );
    }

    let source = open_source(&cfg.source.url, cfg.source.width, cfg.source.height)?;
    let sink = AlertSink {
        board: AnnotationBoard::new(),
        snapshots: cfg.snapshots.clone(),
    };

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;
    }

    log::info!(
        "motiond {} starting: blur={} threshold={} dilation={} min_area={}",
        env!("CARGO_PKG_VERSION"),
        cfg.detector.blur_kernel_size,
        cfg.detector.diff_threshold,
        cfg.detector.dilation_iterations,
        cfg.detector.min_region_area
    );

    let mut detection = DetectionLoop::new(source, sink, cfg.detector.clone())?;
    let reason = detection.run(&stop, cfg.max_cycles);

    let (_, sink, stats) = detection.into_parts();
    log::info!(
        "motiond exiting ({:?}): cycles={} frames={} misses={} skipped={} alerts={} open_labels={}",
        reason,
        stats.cycles,
        stats.frames_processed,
        stats.acquisition_misses,
        stats.skipped,
        sink.board.alerts_raised(),
        sink.board.len()
    );
    Ok(())
}
