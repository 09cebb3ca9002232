// Batch driver over the persisted link-cache file the catalog scraper
// produces: one `<manifestUrl> "<targetFilename>"` entry per line.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::DownloadError;
use crate::job::Downloader;
use crate::progress::ProgressCallback;

/// One link-cache line. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub manifest_url: String,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Parse one link-cache line. Returns `None` for blank lines. Tolerates both
/// CRLF and LF endings; the quoted target filename may contain spaces.
pub fn parse_entry(line: &str, line_number: usize) -> Result<Option<BatchEntry>, DownloadError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let (url, rest) = trimmed
        .split_once(char::is_whitespace)
        .ok_or_else(|| DownloadError::LinkCacheParse {
            line: line_number,
            reason: "missing target filename".to_string(),
        })?;

    let rest = rest.trim_start();
    let target = rest
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(rest);
    if target.is_empty() {
        return Err(DownloadError::LinkCacheParse {
            line: line_number,
            reason: "empty target filename".to_string(),
        });
    }

    Ok(Some(BatchEntry {
        manifest_url: url.to_string(),
        target: PathBuf::from(target),
    }))
}

/// Serialize an entry in the exact framing the scraper writes: CRLF-ended,
/// target filename quoted.
pub fn format_entry(manifest_url: &str, target: &Path) -> String {
    format!("{manifest_url} \"{}\"\r\n", target.display())
}

/// Append one entry to a link-cache file, creating it if absent.
pub async fn append_entry(
    cache_path: &Path,
    manifest_url: &str,
    target: &Path,
) -> Result<(), DownloadError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(cache_path)
        .await?;
    file.write_all(format_entry(manifest_url, target).as_bytes())
        .await?;
    file.flush().await?;
    Ok(())
}

impl Downloader {
    /// Run every entry of a link-cache file in order.
    ///
    /// Entries whose target file already exists are skipped untouched, so a
    /// re-run over a completed batch is idempotent. A single entry's failure
    /// (including a malformed line) is logged and counted; the batch
    /// proceeds to the next entry. Cancellation stops before the next entry
    /// begins.
    pub async fn run_batch(
        &self,
        cache_path: &Path,
        on_progress: Option<&ProgressCallback>,
        token: &CancellationToken,
    ) -> Result<BatchSummary, DownloadError> {
        let text = tokio::fs::read_to_string(cache_path).await?;
        let mut summary = BatchSummary::default();

        for (line_index, raw_line) in text.lines().enumerate() {
            if token.is_cancelled() {
                info!("cancelled; stopping batch");
                break;
            }

            let entry = match parse_entry(raw_line, line_index + 1) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "skipping malformed link-cache line");
                    summary.failed += 1;
                    continue;
                }
            };

            if tokio::fs::try_exists(&entry.target).await? {
                debug!(target = %entry.target.display(), "target exists, skipping");
                summary.skipped += 1;
                continue;
            }

            info!(url = %entry.manifest_url, target = %entry.target.display(), "starting batch entry");
            match self
                .run_job(&entry.manifest_url, &entry.target, on_progress, token)
                .await
            {
                Ok(report) => {
                    info!(
                        target = %report.output.display(),
                        segments = report.segments,
                        bytes = report.bytes,
                        "batch entry complete"
                    );
                    summary.completed += 1;
                }
                Err(DownloadError::Cancelled) => {
                    info!("cancelled; staged progress kept for resumption");
                    break;
                }
                Err(e) => {
                    error!(
                        url = %entry.manifest_url,
                        target = %entry.target.display(),
                        error = %e,
                        "batch entry failed, continuing"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_target() {
        let entry = parse_entry("https://example.com/hi.m3u8 \"show-S01E01.mp4\"", 1)
            .unwrap()
            .unwrap();
        assert_eq!(entry.manifest_url, "https://example.com/hi.m3u8");
        assert_eq!(entry.target, PathBuf::from("show-S01E01.mp4"));
    }

    #[test]
    fn tolerates_crlf_and_lf() {
        // `str::lines` strips `\n`; the trailing `\r` must be stripped here.
        let entry = parse_entry("https://example.com/hi.m3u8 \"out.mp4\"\r", 1)
            .unwrap()
            .unwrap();
        assert_eq!(entry.target, PathBuf::from("out.mp4"));
    }

    #[test]
    fn quoted_target_keeps_inner_spaces() {
        let entry = parse_entry("https://example.com/hi.m3u8 \"My Show E01.mp4\"", 1)
            .unwrap()
            .unwrap();
        assert_eq!(entry.target, PathBuf::from("My Show E01.mp4"));
    }

    #[test]
    fn unquoted_target_is_accepted() {
        let entry = parse_entry("https://example.com/hi.m3u8 out.mp4", 1)
            .unwrap()
            .unwrap();
        assert_eq!(entry.target, PathBuf::from("out.mp4"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_entry("", 1).unwrap().is_none());
        assert!(parse_entry("   \r", 2).unwrap().is_none());
    }

    #[test]
    fn missing_target_is_an_error() {
        let err = parse_entry("https://example.com/hi.m3u8", 7).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::LinkCacheParse { line: 7, .. }
        ));
    }

    #[test]
    fn format_entry_matches_legacy_framing() {
        let line = format_entry(
            "https://example.com/hi.m3u8",
            Path::new("show-S01E01.mp4"),
        );
        assert_eq!(line, "https://example.com/hi.m3u8 \"show-S01E01.mp4\"\r\n");
        // round-trips through the parser
        let entry = parse_entry(line.trim_end_matches('\n'), 1).unwrap().unwrap();
        assert_eq!(entry.target, PathBuf::from("show-S01E01.mp4"));
    }
}
