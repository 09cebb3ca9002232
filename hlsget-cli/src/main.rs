mod error;
mod input;

use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use hlsget_engine::{Downloader, DownloaderConfig, ProgressCallback, ProgressEvent};

use crate::error::AppError;
use crate::input::InputKind;

#[derive(Parser, Debug)]
#[command(
    name = "hlsget",
    version,
    about = "Downloads HLS VOD streams: fetches a playlist, stages every segment with \
             retry and resumption, and assembles them into a single file"
)]
struct Args {
    /// Manifest URL (`*.m3u8`) or a `-linkscache.txt` file produced by the
    /// catalog scraper
    url: String,

    /// Target file for single-manifest downloads
    filename: Option<String>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Verify TLS certificates (disabled by default for compatibility with
    /// the hosts this tool was built for)
    #[arg(long)]
    verify_tls: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        error!("Application error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let kind = input::detect_input(&args.url).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "`{}` is neither a manifest URL nor a link-cache file; catalog pages are \
             handled by the companion scraper",
            args.url
        ))
    })?;

    let config = DownloaderConfig {
        danger_accept_invalid_certs: !args.verify_tls,
        ..DownloaderConfig::default()
    };
    let downloader = Downloader::new(config)?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; finishing the current segment then stopping");
            signal_token.cancel();
        }
    });

    let (_bar, on_progress) = progress_callback();

    match kind {
        InputKind::Manifest => {
            let filename = args.filename.as_deref().ok_or_else(|| {
                AppError::InvalidInput(
                    "target filename is required for manifest downloads".to_string(),
                )
            })?;
            let report = downloader
                .run_job(&args.url, Path::new(filename), Some(&on_progress), &token)
                .await?;
            info!(
                target = %report.output.display(),
                segments = report.segments,
                resumed = report.resumed,
                bytes = report.bytes,
                "download complete"
            );
        }
        InputKind::LinkCache => {
            let summary = downloader
                .run_batch(Path::new(&args.url), Some(&on_progress), &token)
                .await?;
            if summary.failed > 0 {
                return Err(AppError::BatchFailed {
                    failed: summary.failed,
                });
            }
        }
    }

    Ok(())
}

/// Count-based progress bar fed by engine events: one pass for segment
/// staging, a second for assembly.
fn progress_callback() -> (ProgressBar, ProgressCallback) {
    let bar = ProgressBar::hidden();
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .expect("static template")
            .progress_chars("=> "),
    );

    let pb = bar.clone();
    let callback: ProgressCallback = Arc::new(move |event| match event {
        ProgressEvent::ManifestResolved { segments } => {
            pb.set_draw_target(ProgressDrawTarget::stderr());
            pb.set_length(segments as u64);
            pb.set_position(0);
            pb.set_message("fetching segments");
        }
        ProgressEvent::SegmentStaged { index, .. } => {
            pb.set_position((index + 1) as u64);
        }
        ProgressEvent::AssemblyStarted { total } => {
            pb.set_length(total as u64);
            pb.set_position(0);
            pb.set_message("assembling");
        }
        ProgressEvent::AssemblyProgress { appended, .. } => {
            pb.set_position(appended as u64);
        }
        ProgressEvent::Assembled { .. } => {
            pb.finish_and_clear();
        }
    });
    (bar, callback)
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
