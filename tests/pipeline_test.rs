mod common;

use std::time::Duration;

use common::create_test_video;
use slidecap::normalize::{CropRect, TargetDims};
use slidecap::pipeline::{self, Job, SLIDES_DIR};

#[test]
fn test_a_real_clip_becomes_a_deck() -> color_eyre::eyre::Result<()> {
    let video = create_test_video();
    let out_root = tempfile::tempdir()?;

    let crop = CropRect::new(0, 240, 0, 320)?;
    let dims = TargetDims::derive(&crop, 120)?;
    let job = Job::new(video, Duration::from_secs(2), crop, dims)?;

    let summary = pipeline::process_video(&job, 0.95, out_root.path())?;

    assert!(summary.kept >= 1);
    assert_eq!(summary.kept, summary.timestamps.len());
    assert!(summary.timestamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(Some(&0), summary.timestamps.first());

    let bytes = std::fs::read(&summary.document)?;
    let doc = lopdf::Document::load_mem(&bytes)?;
    assert_eq!(summary.kept, doc.get_pages().len());

    // the per-frame jpgs are gone, only the deck remains
    let leftovers: Vec<_> = std::fs::read_dir(out_root.path().join(SLIDES_DIR))?
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |x| x == "jpg"))
        .collect();
    assert!(leftovers.is_empty(), "leftover artifacts: {leftovers:?}");

    Ok(())
}

#[test]
fn test_the_audio_track_comes_out_as_mp3() -> color_eyre::eyre::Result<()> {
    let video = common::create_test_video_with_audio();
    let out_root = tempfile::tempdir()?;

    let crop = CropRect::new(0, 240, 0, 320)?;
    let dims = TargetDims::derive(&crop, 120)?;
    let job = Job::new(video, Duration::from_secs(2), crop, dims)?;

    pipeline::process_video(&job, 0.95, out_root.path())?;

    let mp3 = out_root
        .path()
        .join(pipeline::AUDIO_DIR)
        .join("testvideo_audio.mp3");
    assert!(mp3.is_file(), "missing {}", mp3.display());
    assert!(std::fs::metadata(&mp3)?.len() > 0);
    Ok(())
}

#[test]
fn test_two_runs_agree() -> color_eyre::eyre::Result<()> {
    let video = create_test_video();

    let crop = CropRect::new(0, 240, 0, 320)?;
    let dims = TargetDims::derive(&crop, 120)?;

    let run = || -> color_eyre::eyre::Result<Vec<u64>> {
        let out_root = tempfile::tempdir()?;
        let job = Job::new(video.clone(), Duration::from_secs(2), crop, dims)?;
        Ok(pipeline::process_video(&job, 0.95, out_root.path())?.timestamps)
    };

    assert_eq!(run()?, run()?);
    Ok(())
}
