//! HLS VOD segment download and assembly engine.
//!
//! The pipeline resolves a manifest URL into an ordered segment list
//! (following variant playlists to the maximum-resolution rendition), stages
//! every segment on disk with bounded retry and restart-safe resumption, and
//! concatenates the staged files into the final output in manifest order.
//! A batch driver runs the same pipeline over a persisted link-cache file.

pub mod assemble;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod naming;
pub mod playlist;
pub mod progress;
pub mod retry;

pub use batch::{BatchEntry, BatchSummary};
pub use config::DownloaderConfig;
pub use error::DownloadError;
pub use fetcher::SegmentFetchOutcome;
pub use job::{Downloader, JobReport};
pub use playlist::{ResolvedManifest, SegmentRef};
pub use progress::{ProgressCallback, ProgressEvent};
pub use retry::RetryPolicy;
