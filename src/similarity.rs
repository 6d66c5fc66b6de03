//! Perceptual similarity between two canonical images. The scorer works on
//! single-channel luminance so that encoding noise and anti-aliasing don't
//! register as slide changes the way a raw pixel diff would.

use image::GrayImage;

#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    /// The normalizer produces images of one fixed size, so differing
    /// dimensions here mean a configuration bug upstream.
    #[error("images differ in size: {0}x{1} vs {2}x{3}")]
    DimensionMismatch(u32, u32, u32, u32),
    #[error("cannot score an empty image")]
    Empty,
}

/// Scores two equally sized luminance images. Higher means more similar, 1.0
/// is identical. A seam so the change detector can be driven by scripted
/// scores in tests.
pub trait SimilarityMetric {
    fn score(&self, a: &GrayImage, b: &GrayImage) -> Result<f32, SimilarityError>;
}

/// Mean structural similarity over sliding uniform windows, the usual
/// constants for 8-bit data. Values land in [-1, 1].
#[derive(Debug, Default, Clone, Copy)]
pub struct Ssim;

const WINDOW: u32 = 7;
const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

impl SimilarityMetric for Ssim {
    fn score(&self, a: &GrayImage, b: &GrayImage) -> Result<f32, SimilarityError> {
        if a.dimensions() != b.dimensions() {
            return Err(SimilarityError::DimensionMismatch(
                a.width(),
                a.height(),
                b.width(),
                b.height(),
            ));
        }
        if a.width() == 0 || a.height() == 0 {
            return Err(SimilarityError::Empty);
        }

        let (width, height) = a.dimensions();
        // Images smaller than the window get one window covering everything.
        let (win_w, win_h) = (WINDOW.min(width), WINDOW.min(height));

        let mut total = 0.0;
        let mut windows = 0u64;
        for y0 in 0..=(height - win_h) {
            for x0 in 0..=(width - win_w) {
                total += window_ssim(a, b, x0, y0, win_w, win_h);
                windows += 1;
            }
        }

        let mean = total / windows as f64;
        Ok(mean.clamp(-1.0, 1.0) as f32)
    }
}

fn window_ssim(a: &GrayImage, b: &GrayImage, x0: u32, y0: u32, w: u32, h: u32) -> f64 {
    let n = (w * h) as f64;

    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            sum_a += a.get_pixel(x, y)[0] as f64;
            sum_b += b.get_pixel(x, y)[0] as f64;
        }
    }
    let mean_a = sum_a / n;
    let mean_b = sum_b / n;

    let mut var_a = 0.0;
    let mut var_b = 0.0;
    let mut covar = 0.0;
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let da = a.get_pixel(x, y)[0] as f64 - mean_a;
            let db = b.get_pixel(x, y)[0] as f64 - mean_b;
            var_a += da * da;
            var_b += db * db;
            covar += da * db;
        }
    }
    var_a /= n;
    var_b /= n;
    covar /= n;

    let numerator = (2.0 * mean_a * mean_b + C1) * (2.0 * covar + C2);
    let denominator =
        (mean_a * mean_a + mean_b * mean_b + C1) * (var_a + var_b + C2);
    numerator / denominator
}
