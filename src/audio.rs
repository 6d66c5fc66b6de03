//! Best-effort audio extraction. Transcoding to mp3 is delegated to the
//! ffmpeg CLI; a failure here never fails the surrounding job.

use std::path::Path;
use std::process::{Command, Stdio};

use color_eyre::eyre::{self, Context};

pub fn extract(video: &Path, out: &Path) -> eyre::Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video)
        .args(["-vn", "-codec:a", "libmp3lame", "-qscale:a", "4"])
        .arg(out)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .wrap_err("failed to execute ffmpeg")?;

    eyre::ensure!(status.success(), "ffmpeg exited with {status}");
    Ok(())
}
