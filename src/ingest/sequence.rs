//! Local image-sequence source.
//!
//! Plays back the PNG/JPEG files of one directory in file-name order. A file that
//! fails to decode is logged and reported as a missed frame; playback continues
//! with the next file.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use super::FrameSource;
use crate::frame::ColorFrame;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    loop_playback: bool,
    frame_count: u64,
    decode_failures: u64,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(anyhow!(
                "image sequence path {} is not a directory",
                dir.display()
            ));
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| anyhow!("failed to list {}: {}", dir.display(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_supported_extension(path))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no image files found in {}", dir.display()));
        }
        log::info!(
            "ImageSequenceSource: {} frames in {}",
            files.len(),
            dir.display()
        );
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            cursor: 0,
            loop_playback: false,
            frame_count: 0,
            decode_failures: 0,
        })
    }

    /// Restart from the first file after the last one instead of ending.
    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Option<ColorFrame> {
        if self.cursor >= self.files.len() {
            if !self.loop_playback {
                return None;
            }
            self.cursor = 0;
        }
        let path = &self.files[self.cursor];
        self.cursor += 1;

        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                log::warn!("failed to decode {}: {}", path.display(), e);
                self.decode_failures += 1;
                return None;
            }
        };
        let frame = match ColorFrame::from_image(image, self.frame_count) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("rejected {}: {}", path.display(), e);
                self.decode_failures += 1;
                return None;
            }
        };
        self.frame_count += 1;
        Some(frame)
    }

    fn is_exhausted(&self) -> bool {
        !self.loop_playback && self.cursor >= self.files.len()
    }

    fn describe(&self) -> String {
        format!("{} ({} files)", self.dir.display(), self.files.len())
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
