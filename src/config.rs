use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::{
    DetectorConfig, DEFAULT_BLUR_KERNEL_SIZE, DEFAULT_CYCLE_INTERVAL, DEFAULT_DIFF_THRESHOLD,
    DEFAULT_DILATION_ITERATIONS, DEFAULT_MIN_REGION_AREA,
};

const DEFAULT_SOURCE_URL: &str = "stub://front_camera";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_SNAPSHOT_EVERY: u64 = 50;

#[derive(Debug, Deserialize, Default)]
struct MotiondConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    snapshots: Option<SnapshotConfigFile>,
    max_cycles: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    blur_kernel_size: Option<u32>,
    diff_threshold: Option<u8>,
    dilation_iterations: Option<u8>,
    min_region_area: Option<u32>,
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SnapshotConfigFile {
    dir: Option<PathBuf>,
    every: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MotiondConfig {
    pub source: SourceSettings,
    pub detector: DetectorConfig,
    pub snapshots: Option<SnapshotSettings>,
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    /// Frame size for synthetic sources.
    pub width: u32,
    pub height: u32,
}

/// Where annotated frames are written, and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSettings {
    pub dir: PathBuf,
    pub every: u64,
}

impl MotiondConfig {
    /// Defaults, then the file named by `MOTION_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MOTION_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MotiondConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();
        let snapshots = file.snapshots.and_then(|snap| {
            snap.dir.map(|dir| SnapshotSettings {
                dir,
                every: snap.every.unwrap_or(DEFAULT_SNAPSHOT_EVERY),
            })
        });
        Self {
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: source.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
                height: source.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            },
            detector: DetectorConfig {
                blur_kernel_size: detector
                    .blur_kernel_size
                    .unwrap_or(DEFAULT_BLUR_KERNEL_SIZE),
                diff_threshold: detector.diff_threshold.unwrap_or(DEFAULT_DIFF_THRESHOLD),
                dilation_iterations: detector
                    .dilation_iterations
                    .unwrap_or(DEFAULT_DILATION_ITERATIONS),
                min_region_area: detector.min_region_area.unwrap_or(DEFAULT_MIN_REGION_AREA),
                cycle_interval: detector
                    .interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_CYCLE_INTERVAL),
            },
            snapshots,
            max_cycles: file.max_cycles,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("MOTION_SOURCE") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(threshold) = std::env::var("MOTION_DIFF_THRESHOLD") {
            self.detector.diff_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("MOTION_DIFF_THRESHOLD must be an integer in 1..=255"))?;
        }
        if let Ok(area) = std::env::var("MOTION_MIN_AREA") {
            self.detector.min_region_area = area
                .parse()
                .map_err(|_| anyhow!("MOTION_MIN_AREA must be an integer pixel count"))?;
        }
        if let Ok(interval) = std::env::var("MOTION_INTERVAL_MS") {
            let millis: u64 = interval
                .parse()
                .map_err(|_| anyhow!("MOTION_INTERVAL_MS must be an integer number of ms"))?;
            self.detector.cycle_interval = Duration::from_millis(millis);
        }
        if let Ok(cycles) = std::env::var("MOTION_MAX_CYCLES") {
            let cycles: u64 = cycles
                .parse()
                .map_err(|_| anyhow!("MOTION_MAX_CYCLES must be an integer"))?;
            self.max_cycles = Some(cycles);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.source.url.trim().is_empty() {
            return Err(anyhow!("source url must not be empty"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source width and height must be greater than zero"));
        }
        if let Some(snapshots) = &self.snapshots {
            if snapshots.every == 0 {
                return Err(anyhow!("snapshots.every must be greater than zero"));
            }
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<MotiondConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: MotiondConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
