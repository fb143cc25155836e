//! Frame sources.
//!
//! - Synthetic scenes (`stub://` URLs) for tests and demos
//! - Local image sequences (a directory of PNG/JPEG files)
//!
//! A source either returns a frame promptly or reports that none was ready.
//! A missing frame is not an error: the loop skips that tick and asks again.

pub mod sequence;
pub mod synthetic;

use anyhow::{anyhow, Result};
use std::path::Path;

use crate::frame::ColorFrame;

pub use sequence::ImageSequenceSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Anything that can hand the detector its next color frame.
pub trait FrameSource {
    /// Next frame, or `None` when nothing is ready this tick.
    fn next_frame(&mut self) -> Option<ColorFrame>;

    /// True once the source will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<ColorFrame> {
        (**self).next_frame()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open a source from a URL: `stub://<name>` or a local directory path.
pub fn open_source(url: &str, width: u32, height: u32) -> Result<Box<dyn FrameSource>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(anyhow!("frame source must not be empty"));
    }
    if url.starts_with("stub://") {
        let source = SyntheticSource::new(SyntheticConfig {
            url: url.to_string(),
            width,
            height,
            ..SyntheticConfig::default()
        })?;
        return Ok(Box::new(source));
    }
    if url.contains("://") {
        return Err(anyhow!(
            "unsupported frame source '{}': only stub:// and local directories",
            url
        ));
    }
    Ok(Box::new(ImageSequenceSource::open(Path::new(url))?))
}
