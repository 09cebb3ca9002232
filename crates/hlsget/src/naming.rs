// Filename-derived path conventions.
//
// The legacy tool derived its scratch locations from the target filename by
// string suffixing (`<target>.tempdir`, `<target>.meta`,
// `<prefix>-linkscache.txt`). These are kept as pure functions so every
// component names the same paths.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::playlist::SegmentRef;

/// Per-job staging directory holding individually fetched segments.
pub fn staging_dir(target: &Path) -> PathBuf {
    append_suffix(target, ".tempdir")
}

/// Side-channel directory the catalog scraper writes screenshots and
/// descriptions into. The engine names it for the collaborator but never
/// reads it.
pub fn metadata_dir(target: &Path) -> PathBuf {
    append_suffix(target, ".meta")
}

/// The persisted link list the scraper produces and the batch driver
/// consumes.
pub fn links_cache_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}-linkscache.txt"))
}

/// Per-episode filename stem used for batch targets: `<prefix>-S01E02`.
pub fn episode_stem(prefix: &str, season: u32, episode: u32) -> String {
    format!("{prefix}-S{season:02}E{episode:02}")
}

/// In-progress twin of a file written atomically (write then rename).
pub fn part_path(path: &Path) -> PathBuf {
    append_suffix(path, ".part")
}

/// Last path component of a segment URI, with any query or fragment
/// stripped. Falls back to "segment" for degenerate URIs.
pub fn segment_basename(uri: &str) -> String {
    let without_suffix = uri
        .split_once(['?', '#'])
        .map_or(uri, |(before, _)| before);
    let name = without_suffix
        .rsplit_once('/')
        .map_or(without_suffix, |(_, after)| after);
    if name.is_empty() {
        "segment".to_string()
    } else {
        name.to_string()
    }
}

/// Staged file name for every segment of a manifest, in manifest order.
///
/// Plain URI basenames are used when they are unique. Some manifest layouts
/// reuse a basename across distinct segment URIs; staging those under the
/// same name would silently overwrite, so when any collision exists every
/// name is prefixed with its zero-padded sequence index instead.
pub fn segment_file_names(segments: &[SegmentRef]) -> Vec<String> {
    let names: Vec<String> = segments
        .iter()
        .map(|s| segment_basename(&s.uri))
        .collect();

    let mut seen = HashSet::new();
    let collides = names.iter().any(|n| !seen.insert(n.as_str()));
    if !collides {
        return names;
    }

    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| format!("{idx:05}-{name}"))
        .collect()
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}
