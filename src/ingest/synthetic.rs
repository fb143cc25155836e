//! Synthetic frame source (`stub://`).
//!
//! Renders a dark background with a bright square that jumps to a new spot every
//! `move_every` frames, so motion shows up on exactly those frames. Optional
//! seeded sensor noise and periodic dropped frames exercise the rest of the loop.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::FrameSource;
use crate::frame::ColorFrame;

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Side of the moving square.
    pub square: u32,
    /// Frames between jumps of the square.
    pub move_every: u64,
    /// Max per-channel noise amplitude; zero disables noise.
    pub noise: u8,
    /// Every n-th request yields no frame; zero disables drops.
    pub drop_every: u64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://scene".to_string(),
            width: 320,
            height: 240,
            square: 40,
            move_every: 25,
            noise: 0,
            drop_every: 0,
            seed: 0,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    rng: StdRng,
    requests: u64,
    frame_count: u64,
    scene_state: u32,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic source needs non-zero dimensions"));
        }
        if config.square == 0 || config.square > config.width || config.square > config.height {
            return Err(anyhow!(
                "square size {} does not fit a {}x{} frame",
                config.square,
                config.width,
                config.height
            ));
        }
        if config.move_every == 0 {
            return Err(anyhow!("move_every must be at least 1"));
        }
        log::info!("SyntheticSource: connected to {}", config.url);
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            requests: 0,
            frame_count: 0,
            scene_state: 0,
        })
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    /// Top-left corner of the square for the current scene state.
    pub fn square_origin(&self) -> (u32, u32) {
        let span_x = self.config.width - self.config.square + 1;
        let span_y = self.config.height - self.config.square + 1;
        let step = self.scene_state.wrapping_mul(37);
        (step % span_x, step.wrapping_mul(3) % span_y)
    }

    fn render(&mut self) -> RgbImage {
        let (sx, sy) = self.square_origin();
        let side = self.config.square;
        let noise = self.config.noise as i16;
        let rng = &mut self.rng;
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            let inside = x >= sx && x < sx + side && y >= sy && y < sy + side;
            let base: i16 = if inside { 230 } else { 20 };
            let jitter = if noise > 0 {
                rng.gen_range(-noise..=noise)
            } else {
                0
            };
            let v = (base + jitter).clamp(0, 255) as u8;
            Rgb([v, v, v])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<ColorFrame> {
        self.requests += 1;
        if self.config.drop_every > 0 && self.requests % self.config.drop_every == 0 {
            log::trace!("SyntheticSource: dropped request {}", self.requests);
            return None;
        }

        if self.frame_count > 0 && self.frame_count % self.config.move_every == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let image = self.render();
        let sequence = self.frame_count;
        self.frame_count += 1;
        ColorFrame::from_image(image, sequence).ok()
    }

    fn describe(&self) -> String {
        format!(
            "{} ({}x{}, synthetic)",
            self.config.url, self.config.width, self.config.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(config: SyntheticConfig) -> SyntheticSource {
        SyntheticSource::new(config).expect("synthetic source")
    }

    #[test]
    fn square_holds_between_moves() {
        let mut src = source(SyntheticConfig {
            move_every: 3,
            ..SyntheticConfig::default()
        });
        let a = src.next_frame().unwrap();
        let b = src.next_frame().unwrap();
        let c = src.next_frame().unwrap();
        let d = src.next_frame().unwrap();
        assert_eq!(a.image(), b.image());
        assert_eq!(b.image(), c.image());
        assert_ne!(c.image(), d.image());
        assert_eq!(d.sequence, 3);
    }

    #[test]
    fn drops_every_nth_request() {
        let mut src = source(SyntheticConfig {
            drop_every: 2,
            ..SyntheticConfig::default()
        });
        assert!(src.next_frame().is_some());
        assert!(src.next_frame().is_none());
        assert!(src.next_frame().is_some());
        assert_eq!(src.frames_captured(), 2);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let cfg = SyntheticConfig {
            noise: 8,
            seed: 42,
            ..SyntheticConfig::default()
        };
        let a = source(cfg.clone()).next_frame().unwrap();
        let b = source(cfg).next_frame().unwrap();
        assert_eq!(a.image(), b.image());
    }

    #[test]
    fn oversized_square_is_rejected() {
        let cfg = SyntheticConfig {
            width: 30,
            height: 30,
            square: 40,
            ..SyntheticConfig::default()
        };
        assert!(SyntheticSource::new(cfg).is_err());
    }
}
