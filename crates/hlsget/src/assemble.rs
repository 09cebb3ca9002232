// Assembler: concatenates staged segment files, in manifest order, into the
// final output file. Writes to a `.part` twin and renames on full success so
// a partial output never exists at the target path.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::DownloadError;
use crate::naming;
use crate::progress::{self, ProgressCallback, ProgressEvent};

/// Concatenate `segment_paths` in order into `target`. Returns the number of
/// bytes written.
pub async fn assemble(
    segment_paths: &[PathBuf],
    target: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<u64, DownloadError> {
    info!(
        count = segment_paths.len(),
        target = %target.display(),
        "assembling segments"
    );
    progress::emit(
        on_progress,
        ProgressEvent::AssemblyStarted {
            total: segment_paths.len(),
        },
    );

    let tmp = naming::part_path(target);
    match write_concatenated(&tmp, segment_paths, on_progress).await {
        Ok(bytes) => {
            tokio::fs::rename(&tmp, target)
                .await
                .map_err(|e| DownloadError::AssemblyWrite {
                    path: target.to_path_buf(),
                    source: e,
                })?;
            info!(target = %target.display(), bytes, "assembly complete");
            progress::emit(
                on_progress,
                ProgressEvent::Assembled {
                    target: target.to_path_buf(),
                    bytes,
                },
            );
            Ok(bytes)
        }
        Err(e) => {
            // Assembly is all-or-nothing: drop the in-progress file so a
            // later run starts clean.
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(e)
        }
    }
}

async fn write_concatenated(
    tmp: &Path,
    segment_paths: &[PathBuf],
    on_progress: Option<&ProgressCallback>,
) -> Result<u64, DownloadError> {
    let mut out = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| DownloadError::AssemblyWrite {
            path: tmp.to_path_buf(),
            source: e,
        })?;

    let mut written = 0u64;
    for (index, path) in segment_paths.iter().enumerate() {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| DownloadError::AssemblyWrite {
                path: path.clone(),
                source: e,
            })?;
        out.write_all(&data)
            .await
            .map_err(|e| DownloadError::AssemblyWrite {
                path: tmp.to_path_buf(),
                source: e,
            })?;
        written += data.len() as u64;
        debug!(segment = index + 1, total = segment_paths.len(), "appended segment");
        progress::emit(
            on_progress,
            ProgressEvent::AssemblyProgress {
                appended: index + 1,
                total: segment_paths.len(),
            },
        );
    }

    out.flush()
        .await
        .map_err(|e| DownloadError::AssemblyWrite {
            path: tmp.to_path_buf(),
            source: e,
        })?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn concatenates_in_given_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.ts");
        let b = dir.path().join("b.ts");
        let c = dir.path().join("c.ts");
        tokio::fs::write(&a, b"AAA").await.unwrap();
        tokio::fs::write(&b, b"BB").await.unwrap();
        tokio::fs::write(&c, b"C").await.unwrap();

        let target = dir.path().join("out.mp4");
        let bytes = assemble(&[c.clone(), a.clone(), b.clone()], &target, None)
            .await
            .expect("assembly should succeed");

        assert_eq!(bytes, 6);
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"CAAABB");
        assert!(!naming::part_path(&target).exists());
    }

    #[tokio::test]
    async fn missing_segment_leaves_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.ts");
        tokio::fs::write(&a, b"AAA").await.unwrap();
        let missing = dir.path().join("gone.ts");

        let target = dir.path().join("out.mp4");
        let res = assemble(&[a, missing], &target, None).await;

        assert!(matches!(res, Err(DownloadError::AssemblyWrite { .. })));
        assert!(!target.exists());
        assert!(!naming::part_path(&target).exists());
    }

    #[tokio::test]
    async fn reports_count_based_progress() {
        use std::sync::Mutex;

        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.ts");
        let b = dir.path().join("b.ts");
        tokio::fs::write(&a, b"AA").await.unwrap();
        tokio::fs::write(&b, b"BB").await.unwrap();

        let counts: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&counts);
        let callback: ProgressCallback = Arc::new(move |event| {
            if let ProgressEvent::AssemblyProgress { appended, .. } = event {
                seen.lock().unwrap().push(appended);
            }
        });

        let target = dir.path().join("out.mp4");
        assemble(&[a, b], &target, Some(&callback))
            .await
            .expect("assembly should succeed");

        assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
    }
}
