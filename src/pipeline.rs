//! Drives one job end-to-end: sample frames at a fixed interval, normalize
//! them, let the change detector pick the keepers, assemble the keepers into
//! a PDF. Strictly sequential, the detector's decision at each step depends
//! on the last keep.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{self, Context};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::assembler::{self, Page};
use crate::audio;
use crate::detector::{ChangeDetector, Verdict};
use crate::frame_extractor::VideoFile;
use crate::normalize::{self, CropRect, TargetDims};
use crate::similarity::{SimilarityMetric, Ssim};
use crate::utils::fsutils;

pub const AUDIO_DIR: &str = "audio";
pub const SLIDES_DIR: &str = "slides";

const JPEG_QUALITY: u8 = 90;

/// One video to process end-to-end. Immutable once built.
#[derive(Debug, Clone)]
pub struct Job {
    pub video: PathBuf,
    pub base_name: String,
    pub interval: Duration,
    pub crop: CropRect,
    pub dims: TargetDims,
}

impl Job {
    pub fn new(
        video: PathBuf,
        interval: Duration,
        crop: CropRect,
        dims: TargetDims,
    ) -> eyre::Result<Self> {
        eyre::ensure!(!interval.is_zero(), "the sampling interval must not be zero");
        let base_name = fsutils::sanitized_stem(&video).ok_or_else(|| {
            eyre::eyre!("video path has no usable filename: {}", video.display())
        })?;
        Ok(Self {
            video,
            base_name,
            interval,
            crop,
            dims,
        })
    }
}

/// Where sampled frames come from. A seam so the sampling loop can be driven
/// by precomputed images in tests instead of a real decoder.
pub trait FrameSource {
    fn duration(&self) -> Duration;

    /// The frame at (or right after) `at`, None when the stream ended early.
    fn frame_at(&mut self, at: Duration) -> eyre::Result<Option<RgbImage>>;
}

impl FrameSource for VideoFile {
    fn duration(&self) -> Duration {
        VideoFile::duration(self)
    }

    fn frame_at(&mut self, at: Duration) -> eyre::Result<Option<RgbImage>> {
        VideoFile::frame_at(self, at)
    }
}

#[derive(Debug)]
pub struct JobSummary {
    pub kept: usize,
    pub timestamps: Vec<u64>,
    pub document: PathBuf,
}

/// Kept frames written to disk during one job, deleted again when the stash
/// goes out of scope, on every exit path.
struct FrameStash {
    dir: PathBuf,
    entries: Vec<StashEntry>,
}

struct StashEntry {
    seconds: u64,
    path: PathBuf,
    width: u32,
    height: u32,
}

impl FrameStash {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            entries: Vec::new(),
        }
    }

    fn stash(&mut self, seconds: u64, img: &RgbImage) -> eyre::Result<()> {
        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
        encoder
            .encode(
                img.as_raw(),
                img.width(),
                img.height(),
                image::ColorType::Rgb8,
            )
            .wrap_err("failed to encode a kept frame")?;

        let path = self.dir.join(format!("{seconds:0>4}.jpg"));
        fs::write(&path, &jpeg)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
        self.entries.push(StashEntry {
            seconds,
            path,
            width: img.width(),
            height: img.height(),
        });
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn timestamps(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.seconds).collect()
    }

    fn pages(&self) -> eyre::Result<Vec<Page>> {
        self.entries
            .iter()
            .map(|e| {
                let jpeg = fs::read(&e.path)
                    .wrap_err_with(|| format!("failed to read back {}", e.path.display()))?;
                Ok(Page {
                    jpeg,
                    width: e.width,
                    height: e.height,
                })
            })
            .collect()
    }
}

impl Drop for FrameStash {
    fn drop(&mut self) {
        for entry in &self.entries {
            if let Err(e) = fs::remove_file(&entry.path) {
                log::debug!("could not remove {}: {e}", entry.path.display());
            }
        }
    }
}

/// Runs the sampling loop and writes the assembled document. Any failure in
/// decoding, normalizing or scoring aborts the whole job; a partial deck from
/// a corrupted sample is worse than no deck.
pub fn run_job<S, M>(
    job: &Job,
    source: &mut S,
    detector: &mut ChangeDetector<M>,
    out_root: &Path,
) -> eyre::Result<JobSummary>
where
    S: FrameSource,
    M: SimilarityMetric,
{
    let slides_dir = out_root.join(SLIDES_DIR);
    fsutils::ensure_dir(&slides_dir).wrap_err("failed to create the slides directory")?;

    let mut stash = FrameStash::new(slides_dir.clone());
    let duration = source.duration();
    let step = job.interval.as_secs();

    let mut seconds = 0u64;
    while Duration::from_secs(seconds) < duration {
        let at = Duration::from_secs(seconds);
        let Some(raw) = source
            .frame_at(at)
            .wrap_err_with(|| format!("failed to decode the frame at {seconds}s"))?
        else {
            break;
        };

        let canonical = normalize::normalize(&raw, &job.crop, &job.dims)
            .wrap_err_with(|| format!("failed to normalize the frame at {seconds}s"))?;

        match detector
            .judge(&canonical)
            .wrap_err_with(|| format!("failed to score the frame at {seconds}s"))?
        {
            Verdict::Keep { score } => {
                log::debug!(
                    "keeping the frame at {seconds}s (score {})",
                    score.map_or("n/a".to_string(), |s| format!("{s:.4}"))
                );
                stash.stash(seconds, &canonical)?;
            }
            Verdict::Drop { score } => {
                log::trace!("dropping the frame at {seconds}s (score {score:.4})");
            }
        }

        seconds += step;
    }

    let document = slides_dir.join(format!("{}.pdf", job.base_name));
    let bytes =
        assembler::assemble(&stash.pages()?).wrap_err("failed to assemble the slide deck")?;
    fs::write(&document, bytes)
        .wrap_err_with(|| format!("failed to write {}", document.display()))?;

    Ok(JobSummary {
        kept: stash.len(),
        timestamps: stash.timestamps(),
        document,
    })
}

/// Opens the real video, extracts its audio track (best-effort) and runs the
/// job with the ssim-backed detector.
pub fn process_video(job: &Job, threshold: f32, out_root: &Path) -> eyre::Result<JobSummary> {
    let mut source = VideoFile::open(&job.video)
        .wrap_err_with(|| format!("failed to open {}", job.video.display()))?;

    if source.has_audio() {
        let audio_dir = out_root.join(AUDIO_DIR);
        fsutils::ensure_dir(&audio_dir).wrap_err("failed to create the audio directory")?;
        let audio_path = audio_dir.join(format!("{}.mp3", job.base_name));
        if let Err(e) = audio::extract(&job.video, &audio_path) {
            log::warn!("audio extraction failed for {}: {e:#}", job.video.display());
        }
    } else {
        log::info!("no audio stream in {}", job.video.display());
    }

    let mut detector = ChangeDetector::new(Ssim, threshold);
    run_job(job, &mut source, &mut detector, out_root)
}
