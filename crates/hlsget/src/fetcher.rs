// Segment fetcher: downloads one media segment with bounded retry and
// stages it atomically for resumption.

use bytes::Bytes;
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::DownloaderConfig;
use crate::error::DownloadError;
use crate::naming;
use crate::retry::{is_transient_reqwest_error, is_transient_status};

/// How a segment ended up staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFetchOutcome {
    /// A non-empty staged file already existed; no network call was made.
    AlreadyStaged,
    /// The segment was downloaded and staged.
    Downloaded { bytes: u64 },
}

pub struct SegmentFetcher {
    client: Client,
    config: Arc<DownloaderConfig>,
}

impl SegmentFetcher {
    pub fn new(client: Client, config: Arc<DownloaderConfig>) -> Self {
        Self { client, config }
    }

    /// Resolve the effective segment URL: absolute `http(s)` URIs are used
    /// as-is, anything else is joined against the manifest base URL.
    pub fn resolve_segment_url(base_url: &Url, uri: &str) -> Result<Url, DownloadError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            Url::parse(uri).map_err(|e| DownloadError::invalid_url(uri, e.to_string()))
        } else {
            base_url
                .join(uri)
                .map_err(|e| DownloadError::invalid_url(uri, e.to_string()))
        }
    }

    /// Fetch one segment to `dest`.
    ///
    /// An existing non-empty `dest` is treated as already downloaded and
    /// returns without a network call. This is a size-zero check only; a
    /// truncated prior download is not detected. The atomic staging write
    /// below guarantees a half-written file can never be observed here.
    pub async fn fetch_segment(
        &self,
        segment_url: &Url,
        dest: &Path,
        token: &CancellationToken,
    ) -> Result<SegmentFetchOutcome, DownloadError> {
        if let Ok(meta) = tokio::fs::metadata(dest).await
            && meta.len() > 0
        {
            debug!(path = %dest.display(), "segment already staged, skipping");
            return Ok(SegmentFetchOutcome::AlreadyStaged);
        }

        let body = self.fetch_with_retries(segment_url, token).await?;

        // Temp-file-then-rename so the resumption check never sees a
        // half-written segment.
        let tmp = naming::part_path(dest);
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, dest).await?;

        debug!(url = %segment_url, bytes = body.len(), "segment staged");
        Ok(SegmentFetchOutcome::Downloaded {
            bytes: body.len() as u64,
        })
    }

    async fn fetch_with_retries(
        &self,
        segment_url: &Url,
        token: &CancellationToken,
    ) -> Result<Bytes, DownloadError> {
        let policy = &self.config.retry;
        let mut attempt = 0u32;

        loop {
            if token.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            attempt += 1;

            match self.fetch_once(segment_url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt >= policy.max_attempts {
                        warn!(url = %segment_url, attempts = attempt, error = %e, "retries exhausted");
                        return Err(DownloadError::SegmentFetchExhausted {
                            url: segment_url.to_string(),
                            attempts: attempt,
                        });
                    }
                    let delay = policy.delay_for_attempt(attempt - 1);
                    warn!(
                        url = %segment_url,
                        attempt,
                        max = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying segment after transient error"
                    );
                    tokio::select! {
                        _ = token.cancelled() => return Err(DownloadError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn fetch_once(&self, segment_url: &Url) -> Result<Bytes, DownloadError> {
        let response = self
            .client
            .get(segment_url.clone())
            .timeout(self.config.segment_timeout)
            .send()
            .await
            .map_err(|e| DownloadError::SegmentFetch {
                url: segment_url.to_string(),
                reason: e.to_string(),
                retryable: is_transient_reqwest_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::SegmentFetch {
                url: segment_url.to_string(),
                reason: format!("HTTP {status}"),
                retryable: is_transient_status(status),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| DownloadError::SegmentFetch {
                url: segment_url.to_string(),
                reason: format!("body read failed: {e}"),
                retryable: true,
            })
    }
}
