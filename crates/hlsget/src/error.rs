use reqwest::StatusCode;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download cancelled")]
    Cancelled,

    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("failed to fetch manifest {url}: {source}")]
    ManifestFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed manifest {url}: {reason}")]
    ManifestParse { url: String, reason: String },

    #[error("request failed with HTTP {status} during {operation} for {url}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        operation: &'static str,
    },

    #[error("segment fetch failed for {url}: {reason}")]
    SegmentFetch {
        url: String,
        reason: String,
        retryable: bool,
    },

    #[error("segment {url} failed after {attempts} attempts")]
    SegmentFetchExhausted { url: String, attempts: u32 },

    #[error("failed to write assembled output via {}: {}", .path.display(), .source)]
    AssemblyWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed link-cache entry at line {line}: {reason}")]
    LinkCacheParse { line: usize, reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn manifest_parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ManifestParse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Whether the failure is transient and a later attempt could succeed.
    ///
    /// Segment fetches carry their own classification; manifest and assembly
    /// failures abort the job outright, so they are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SegmentFetch { retryable, .. } => *retryable,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Cancelled
            | Self::InvalidUrl { .. }
            | Self::ManifestFetch { .. }
            | Self::ManifestParse { .. }
            | Self::SegmentFetchExhausted { .. }
            | Self::AssemblyWrite { .. }
            | Self::LinkCacheParse { .. }
            | Self::Configuration { .. }
            | Self::Io { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_fetch_classification_is_carried() {
        let transient = DownloadError::SegmentFetch {
            url: "http://example.com/seg0.ts".to_string(),
            reason: "HTTP 500".to_string(),
            retryable: true,
        };
        assert!(transient.is_retryable());

        let permanent = DownloadError::SegmentFetch {
            url: "http://example.com/seg0.ts".to_string(),
            reason: "HTTP 404".to_string(),
            retryable: false,
        };
        assert!(!permanent.is_retryable());
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!DownloadError::Cancelled.is_retryable());
        assert!(
            !DownloadError::SegmentFetchExhausted {
                url: "http://example.com/seg0.ts".to_string(),
                attempts: 3,
            }
            .is_retryable()
        );
        assert!(
            !DownloadError::manifest_parse("http://example.com/a.m3u8", "not a playlist")
                .is_retryable()
        );
    }

    #[test]
    fn server_errors_are_retryable_statuses() {
        let err = DownloadError::HttpStatus {
            status: StatusCode::BAD_GATEWAY,
            url: "http://example.com/a.m3u8".to_string(),
            operation: "manifest fetch",
        };
        assert!(err.is_retryable());

        let err = DownloadError::HttpStatus {
            status: StatusCode::FORBIDDEN,
            url: "http://example.com/a.m3u8".to_string(),
            operation: "manifest fetch",
        };
        assert!(!err.is_retryable());
    }
}
