// NOTE: every test will complain about the functions it doesn't use
#![allow(unused)]

use std::path::PathBuf;
use std::process::Stdio;

/// Returns cargo's tmpdir
pub fn cargo_tmpdir() -> PathBuf {
    PathBuf::from(option_env!("CARGO_TARGET_TMPDIR").expect("no cargo tmpdir???"))
}

/// Synthesizes a short test clip with the ffmpeg CLI, once per test run.
pub fn create_test_video() -> PathBuf {
    let tmpvideo = cargo_tmpdir().join("testvideo.mkv");

    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::fs::remove_file(&tmpvideo).ok();
        std::process::Command::new("ffmpeg")
            .args([
                "-f",
                "lavfi",
                "-i",
                "testsrc=duration=10:rate=25",
                tmpvideo.as_os_str().to_str().expect("no probs, probably"),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status()
            .expect("failed to execute ffmpeg");
    });

    tmpvideo
}

/// Like [`create_test_video`] but with a sine tone muxed in.
pub fn create_test_video_with_audio() -> PathBuf {
    let tmpvideo = cargo_tmpdir().join("testvideo_audio.mkv");

    use std::sync::Once;
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::fs::remove_file(&tmpvideo).ok();
        std::process::Command::new("ffmpeg")
            .args([
                "-f",
                "lavfi",
                "-i",
                "testsrc=duration=10:rate=25",
                "-f",
                "lavfi",
                "-i",
                "sine=frequency=440:duration=10",
                "-c:a",
                "aac",
                "-shortest",
                tmpvideo.as_os_str().to_str().expect("no probs, probably"),
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .status()
            .expect("failed to execute ffmpeg");
    });

    tmpvideo
}
