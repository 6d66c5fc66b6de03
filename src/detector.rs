//! The keep/drop decision. A small state machine that holds the luminance of
//! the last kept canonical image and compares every new sample against it.
//!
//! Comparing against the last *kept* frame, rather than the previous sample,
//! stops slow drift from accumulating below the threshold into an undetected
//! slide change. The tradeoff is that reverting to an older slide still
//! counts as a change.

use image::{GrayImage, RgbImage};

use crate::similarity::{SimilarityError, SimilarityMetric};
use crate::utils::imgutils;

/// The outcome for one normalized sample. Scores are reported for logging;
/// the first kept frame has none since there was nothing to compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Keep { score: Option<f32> },
    Drop { score: f32 },
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep { .. })
    }
}

pub struct ChangeDetector<M> {
    metric: M,
    threshold: f32,
    last_kept: Option<GrayImage>,
}

impl<M: SimilarityMetric> ChangeDetector<M> {
    pub fn new(metric: M, threshold: f32) -> Self {
        Self {
            metric,
            threshold,
            last_kept: None,
        }
    }

    /// Judges one canonical image. Keeps it iff there is no prior kept frame
    /// yet, or its similarity to the last kept frame is below the threshold.
    /// On keep the held image is replaced, on drop it is untouched.
    pub fn judge(&mut self, canonical: &RgbImage) -> Result<Verdict, SimilarityError> {
        let gray = imgutils::grayscale(canonical);
        match &self.last_kept {
            None => {
                self.last_kept = Some(gray);
                Ok(Verdict::Keep { score: None })
            }
            Some(held) => {
                let score = self.metric.score(held, &gray)?;
                if score < self.threshold {
                    self.last_kept = Some(gray);
                    Ok(Verdict::Keep { score: Some(score) })
                } else {
                    Ok(Verdict::Drop { score })
                }
            }
        }
    }
}
