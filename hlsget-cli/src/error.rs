use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download error: {0}")]
    Download(#[from] hlsget_engine::DownloadError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{failed} batch entry(ies) failed")]
    BatchFailed { failed: usize },
}
