use std::path::Path;

/// What the positional `url` argument refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An HLS manifest URL; downloads a single target file.
    Manifest,
    /// A link-cache file produced by the catalog scraper; runs the batch
    /// driver over its entries.
    LinkCache,
}

/// Detect the input kind the way the legacy tool did: a `.m3u8` suffix on
/// the URL path means a manifest, a `-linkscache.txt` suffix (or an existing
/// local file) means a link cache. Anything else is the catalog scraper's
/// territory and is rejected here.
pub fn detect_input(input: &str) -> Option<InputKind> {
    let path_part = input
        .split_once(['?', '#'])
        .map_or(input, |(before, _)| before);
    if path_part.ends_with(".m3u8") {
        return Some(InputKind::Manifest);
    }
    if input.ends_with("-linkscache.txt") || Path::new(input).is_file() {
        return Some(InputKind::LinkCache);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_urls_are_detected() {
        assert_eq!(
            detect_input("https://cdn.example.com/v/master.m3u8"),
            Some(InputKind::Manifest)
        );
        assert_eq!(
            detect_input("https://cdn.example.com/v/master.m3u8?token=abc"),
            Some(InputKind::Manifest)
        );
    }

    #[test]
    fn link_cache_paths_are_detected() {
        assert_eq!(
            detect_input("show-linkscache.txt"),
            Some(InputKind::LinkCache)
        );
        assert_eq!(
            detect_input("/data/show-linkscache.txt"),
            Some(InputKind::LinkCache)
        );
    }

    #[test]
    fn catalog_pages_are_rejected() {
        assert_eq!(detect_input("https://example.com/series/42"), None);
    }
}
