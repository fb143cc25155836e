use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::error::{DetectError, DetectResult};

/// Mask value of a changed pixel.
pub const MASK_ON: u8 = 255;

/// Binary "what changed" mask between the current and reference intensity frames.
#[derive(Clone, Copy, Debug)]
pub struct ChangeMask {
    threshold: u8,
    dilation_iterations: u8,
}

impl ChangeMask {
    pub fn new(threshold: u8, dilation_iterations: u8) -> Self {
        Self {
            threshold,
            dilation_iterations,
        }
    }

    /// Difference, binarize, then dilate.
    ///
    /// Each dilation pass uses a 3x3 square; `n` passes equal one pass with a
    /// (2n+1)x(2n+1) square, which is what the chessboard-norm dilate computes.
    pub fn compute(&self, current: &GrayImage, reference: &GrayImage) -> DetectResult<GrayImage> {
        let delta = abs_diff(current, reference)?;
        let binary = threshold(&delta, self.threshold);
        if self.dilation_iterations == 0 {
            return Ok(binary);
        }
        Ok(dilate(&binary, Norm::LInf, self.dilation_iterations))
    }
}

pub fn abs_diff(current: &GrayImage, reference: &GrayImage) -> DetectResult<GrayImage> {
    if current.dimensions() != reference.dimensions() {
        return Err(DetectError::DimensionMismatch {
            current: current.dimensions(),
            reference: reference.dimensions(),
        });
    }
    Ok(GrayImage::from_fn(current.width(), current.height(), |x, y| {
        let a = current.get_pixel(x, y).0[0];
        let b = reference.get_pixel(x, y).0[0];
        Luma([a.abs_diff(b)])
    }))
}

/// Pixels at or above `cut` become `MASK_ON`, the rest zero.
pub fn threshold(delta: &GrayImage, cut: u8) -> GrayImage {
    GrayImage::from_fn(delta.width(), delta.height(), |x, y| {
        if delta.get_pixel(x, y).0[0] >= cut {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_on(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p.0[0] == MASK_ON).count()
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let a = GrayImage::new(10, 10);
        let b = GrayImage::new(10, 11);
        let err = ChangeMask::new(30, 2).compute(&a, &b).unwrap_err();
        assert_eq!(
            err,
            DetectError::DimensionMismatch {
                current: (10, 10),
                reference: (10, 11)
            }
        );
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut delta = GrayImage::new(3, 1);
        delta.put_pixel(0, 0, Luma([29]));
        delta.put_pixel(1, 0, Luma([30]));
        delta.put_pixel(2, 0, Luma([200]));
        let mask = threshold(&delta, 30);
        assert_eq!(mask.as_raw(), &vec![0, MASK_ON, MASK_ON]);
    }

    #[test]
    fn identical_frames_produce_empty_mask() {
        let a = GrayImage::from_pixel(20, 20, Luma([77]));
        let mask = ChangeMask::new(30, 2).compute(&a, &a.clone()).unwrap();
        assert_eq!(count_on(&mask), 0);
    }

    #[test]
    fn dilation_grows_single_pixel_to_square() {
        let reference = GrayImage::new(11, 11);
        let mut current = GrayImage::new(11, 11);
        current.put_pixel(5, 5, Luma([255]));

        let undilated = ChangeMask::new(30, 0).compute(&current, &reference).unwrap();
        assert_eq!(count_on(&undilated), 1);

        let dilated = ChangeMask::new(30, 2).compute(&current, &reference).unwrap();
        assert_eq!(count_on(&dilated), 25);
        assert_eq!(dilated.get_pixel(3, 3).0[0], MASK_ON);
        assert_eq!(dilated.get_pixel(2, 5).0[0], 0);
    }

    #[test]
    fn diff_is_symmetric() {
        let a = GrayImage::from_pixel(4, 4, Luma([10]));
        let b = GrayImage::from_pixel(4, 4, Luma([60]));
        assert_eq!(abs_diff(&a, &b).unwrap(), abs_diff(&b, &a).unwrap());
    }
}
