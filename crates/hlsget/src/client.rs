use reqwest::Client;
use tracing::warn;

use crate::config::DownloaderConfig;
use crate::error::DownloadError;

/// Build the shared HTTP client from the downloader configuration.
pub fn build_client(config: &DownloaderConfig) -> Result<Client, DownloadError> {
    if config.danger_accept_invalid_certs {
        warn!("TLS certificate verification is disabled");
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
        .build()
        .map_err(|e| DownloadError::configuration(format!("failed to build HTTP client: {e}")))
}
