// Download orchestrator: resolves the manifest, drives the segment fetcher
// over every segment in order, and hands the staged files to the assembler.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::assemble;
use crate::client::build_client;
use crate::config::DownloaderConfig;
use crate::error::DownloadError;
use crate::fetcher::{SegmentFetchOutcome, SegmentFetcher};
use crate::naming;
use crate::playlist::{self, ResolvedManifest};
use crate::progress::{self, ProgressCallback, ProgressEvent};

/// Result of a successfully assembled job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub output: PathBuf,
    pub segments: usize,
    /// Segments served from the staging directory without a network call.
    pub resumed: usize,
    pub bytes: u64,
}

pub struct Downloader {
    client: Client,
    config: Arc<DownloaderConfig>,
    fetcher: SegmentFetcher,
}

impl Downloader {
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = build_client(&config)?;
        let config = Arc::new(config);
        let fetcher = SegmentFetcher::new(client.clone(), Arc::clone(&config));
        Ok(Self {
            client,
            config,
            fetcher,
        })
    }

    /// Resolve a manifest URL down to its media playlist.
    pub async fn resolve(&self, manifest_url: &str) -> Result<ResolvedManifest, DownloadError> {
        playlist::resolve(&self.client, &self.config, manifest_url).await
    }

    /// Download one target file: resolve, stage every segment in manifest
    /// order, then assemble.
    ///
    /// The staging directory (`<target>.tempdir/`) persists across runs;
    /// segments already staged there are not fetched again, and the
    /// directory is never deleted here. Any segment failure is terminal for
    /// the job and no output file is produced.
    pub async fn run_job(
        &self,
        manifest_url: &str,
        target: &Path,
        on_progress: Option<&ProgressCallback>,
        token: &CancellationToken,
    ) -> Result<JobReport, DownloadError> {
        let staging = naming::staging_dir(target);
        if tokio::fs::try_exists(&staging).await? {
            info!(staging = %staging.display(), "staging directory exists, resuming download");
        } else {
            tokio::fs::create_dir_all(&staging).await?;
            debug!(staging = %staging.display(), "staging directory created");
        }

        let manifest = self.resolve(manifest_url).await?;
        info!(
            url = %manifest.url,
            segments = manifest.segments.len(),
            "manifest resolved"
        );
        progress::emit(
            on_progress,
            ProgressEvent::ManifestResolved {
                segments: manifest.segments.len(),
            },
        );

        let names = naming::segment_file_names(&manifest.segments);
        let total = manifest.segments.len();
        let mut staged_paths = Vec::with_capacity(total);
        let mut resumed = 0usize;

        for (index, (segment, name)) in manifest.segments.iter().zip(&names).enumerate() {
            if token.is_cancelled() {
                info!(
                    staged = index,
                    total,
                    "cancelled; staged progress kept for resumption"
                );
                return Err(DownloadError::Cancelled);
            }

            let segment_url =
                SegmentFetcher::resolve_segment_url(&manifest.base_url, &segment.uri)?;
            let dest = staging.join(name);
            let outcome = self.fetcher.fetch_segment(&segment_url, &dest, token).await?;
            if outcome == SegmentFetchOutcome::AlreadyStaged {
                resumed += 1;
            }
            progress::emit(
                on_progress,
                ProgressEvent::SegmentStaged {
                    index,
                    total,
                    resumed: outcome == SegmentFetchOutcome::AlreadyStaged,
                },
            );
            staged_paths.push(dest);
        }

        let bytes = assemble::assemble(&staged_paths, target, on_progress).await?;
        Ok(JobReport {
            output: target.to_path_buf(),
            segments: staged_paths.len(),
            resumed,
            bytes,
        })
    }
}
