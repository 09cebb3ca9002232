use std::path::PathBuf;
use std::sync::Arc;

/// Progress notifications emitted while a job runs. Counts are segment
/// counts, not bytes.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    ManifestResolved {
        segments: usize,
    },
    SegmentStaged {
        index: usize,
        total: usize,
        /// True when the segment was already on disk from a prior run.
        resumed: bool,
    },
    AssemblyStarted {
        total: usize,
    },
    AssemblyProgress {
        appended: usize,
        total: usize,
    },
    Assembled {
        target: PathBuf,
        bytes: u64,
    },
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync + 'static>;

pub(crate) fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
