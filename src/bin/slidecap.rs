use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use slidecap::{
    bin_common::{
        args::{normalize::NormalizeCli, similarity::SimiCli},
        init::{init_eyre, init_logger},
    },
    pipeline::{self, Job},
    utils::fsutils::all_files,
};

#[derive(Parser, Debug)]
#[command()]
/// Extracts a slide deck (and the audio track) from every video in a folder
struct Cli {
    #[command(flatten)]
    normalize: NormalizeCli,

    #[command(flatten)]
    similarity: SimiCli,

    /// Seconds between sampled frames
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Folder with the videos to process; `slides/` and `audio/` are created
    /// inside it
    dir: PathBuf,
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = Cli::parse();
    init_logger(cli.logfile.as_deref())?;

    let norm = cli
        .normalize
        .to_args()
        .wrap_err("invalid crop configuration")?;
    let simi = cli.similarity.to_args();
    let interval = Duration::from_secs(cli.interval);

    let videos = all_files(&cli.dir)
        .wrap_err_with(|| format!("failed to list the files in {}", cli.dir.display()))?;
    log::info!("Found {} files in {}", videos.len(), cli.dir.display());

    let mut failed = 0usize;
    for video in videos {
        log::info!("Processing {}", video.display());

        let result = Job::new(video.clone(), interval, norm.crop(), norm.dims())
            .and_then(|job| pipeline::process_video(&job, simi.threshold(), &cli.dir));

        // one bad video must not abort the batch
        match result {
            Ok(summary) => log::info!(
                "Kept {} frames from {}, wrote {}",
                summary.kept,
                video.display(),
                summary.document.display()
            ),
            Err(e) => {
                failed += 1;
                log::error!("Failed to process {}: {e:#}", video.display());
            }
        }
    }

    if failed > 0 {
        log::warn!("{failed} job(s) failed");
    }
    Ok(())
}
