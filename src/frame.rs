//! Color frames handed to the detector by frame sources.
//!
//! - `ColorFrame`: owned RGB8 pixels plus dimensions and a capture sequence number.
//! - `PixelFormat`: layouts a source may deliver; everything is normalized to RGB on entry.
//!
//! A frame is never mutated once built. Every pipeline stage produces a new image,
//! so the annotated output is a copy and the caller's frame stays untouched.

use image::RgbImage;

use crate::error::{DetectError, DetectResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    /// Camera-native channel order.
    Bgr24,
    Nv12,
}

/// One still color image from the video sequence.
#[derive(Clone, Debug)]
pub struct ColorFrame {
    image: RgbImage,
    /// Capture order assigned by the source (not a timestamp).
    pub sequence: u64,
}

impl ColorFrame {
    /// Build a frame from raw bytes in the given layout.
    pub fn from_raw(
        pixels: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
        sequence: u64,
    ) -> DetectResult<Self> {
        check_dimensions(width, height)?;
        let rgb = normalize_to_rgb(pixels, width, height, format)?;
        let image = RgbImage::from_raw(width, height, rgb)
            .ok_or_else(|| DetectError::invalid_frame("pixel buffer too small"))?;
        Ok(Self { image, sequence })
    }

    /// Wrap an already decoded RGB image.
    pub fn from_image(image: RgbImage, sequence: u64) -> DetectResult<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image, sequence })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Copy of the pixels as an image the caller may draw on.
    pub fn to_image(&self) -> RgbImage {
        self.image.clone()
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

pub(crate) fn check_dimensions(width: u32, height: u32) -> DetectResult<()> {
    if width == 0 || height == 0 {
        return Err(DetectError::invalid_frame(format!(
            "zero dimension {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> DetectResult<Vec<u8>> {
    match format {
        PixelFormat::Rgb24 => {
            check_packed_len(pixels, width, height)?;
            Ok(pixels.to_vec())
        }
        PixelFormat::Bgr24 => {
            check_packed_len(pixels, width, height)?;
            Ok(pixels
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect())
        }
        PixelFormat::Nv12 => nv12_to_rgb(pixels, width, height),
    }
}

fn check_packed_len(pixels: &[u8], width: u32, height: u32) -> DetectResult<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| DetectError::invalid_frame("frame dimensions overflow"))?;
    if pixels.len() != expected {
        return Err(DetectError::invalid_frame(format!(
            "packed frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        )));
    }
    Ok(())
}

fn nv12_to_rgb(pixels: &[u8], width: u32, height: u32) -> DetectResult<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    if w % 2 != 0 || h % 2 != 0 {
        return Err(DetectError::invalid_frame(format!(
            "NV12 requires even dimensions, got {}x{}",
            width, height
        )));
    }
    let y_plane = w
        .checked_mul(h)
        .ok_or_else(|| DetectError::invalid_frame("NV12 frame dimensions overflow"))?;
    let expected = y_plane + y_plane / 2;
    if pixels.len() != expected {
        return Err(DetectError::invalid_frame(format!(
            "NV12 frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        )));
    }

    let mut rgb = vec![0u8; y_plane * 3];
    for j in 0..h {
        for i in 0..w {
            let y = pixels[j * w + i] as f32;
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;

            let r = y + 1.402_f32 * v;
            let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
            let b = y + 1.772_f32 * u;

            let offset = (j * w + i) * 3;
            rgb[offset] = clamp_to_u8(r);
            rgb[offset + 1] = clamp_to_u8(g);
            rgb[offset + 2] = clamp_to_u8(b);
        }
    }

    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_input_is_swapped_to_rgb() {
        let frame = ColorFrame::from_raw(&[1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Bgr24, 0)
            .expect("bgr frame");
        assert_eq!(frame.image().as_raw(), &vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn nv12_conversion_produces_gray() {
        let nv12 = [vec![128u8; 4], vec![128u8; 2]].concat();
        let frame = ColorFrame::from_raw(&nv12, 2, 2, PixelFormat::Nv12, 0).expect("nv12 frame");
        assert_eq!(frame.image().as_raw(), &vec![128u8; 12]);
    }

    #[test]
    fn zero_dimensions_are_invalid() {
        let err = ColorFrame::from_raw(&[], 0, 4, PixelFormat::Rgb24, 0).unwrap_err();
        assert!(matches!(err, DetectError::InvalidFrame { .. }));
        let err = ColorFrame::from_image(RgbImage::new(4, 0), 0).unwrap_err();
        assert!(matches!(err, DetectError::InvalidFrame { .. }));
    }

    #[test]
    fn short_buffer_is_invalid() {
        let err = ColorFrame::from_raw(&[0u8; 8], 1, 3, PixelFormat::Rgb24, 0).unwrap_err();
        assert!(matches!(err, DetectError::InvalidFrame { .. }));
    }
}
