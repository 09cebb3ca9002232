use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Configurable options for the downloader.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// User agent string sent with every request.
    pub user_agent: String,

    /// Connection timeout (time to establish the initial connection).
    pub connect_timeout: Duration,

    /// Overall timeout for a single manifest request.
    pub manifest_timeout: Duration,

    /// Overall timeout for a single segment request attempt.
    pub segment_timeout: Duration,

    /// Skip TLS peer verification (reqwest's `danger_accept_invalid_certs`).
    ///
    /// Defaults to `true` for compatibility with the sources this tool was
    /// built for; override from the CLI when talking to trusted hosts.
    pub danger_accept_invalid_certs: bool,

    /// Maximum depth of variant-playlist indirection before the manifest is
    /// considered malformed. Guards against cyclic master playlists.
    pub max_variant_depth: u8,

    /// Retry behavior for segment fetches. Manifests are never retried.
    pub retry: RetryPolicy,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout: Duration::from_secs(30),
            manifest_timeout: Duration::from_secs(30),
            segment_timeout: Duration::from_secs(120),
            danger_accept_invalid_certs: true,
            max_variant_depth: 5,
            retry: RetryPolicy::default(),
        }
    }
}
