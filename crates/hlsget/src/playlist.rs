// Manifest resolver: fetches a playlist, follows variant indirection down to
// a media playlist, and exposes its segments in declaration order.

use m3u8_rs::{MasterPlaylist, Playlist, VariantStream, parse_playlist_res};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::DownloaderConfig;
use crate::error::DownloadError;

/// One media segment reference. Position in `ResolvedManifest::segments` is
/// the sole ordering key for reassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub uri: String,
}

/// The leaf (non-variant) manifest after variant resolution.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    /// URL of the media playlist the segments came from.
    pub url: Url,
    /// Base URL relative segment URIs are joined against.
    pub base_url: Url,
    /// Segments in exact declaration order.
    pub segments: Vec<SegmentRef>,
}

/// Resolve a manifest URL to its media playlist.
///
/// Master playlists select the maximum-resolution variant (pixel area,
/// first-declared wins ties) and recurse, bounded by
/// `config.max_variant_depth`. Transport failures are not retried at this
/// layer; retry applies to segments only.
pub async fn resolve(
    client: &Client,
    config: &DownloaderConfig,
    manifest_url: &str,
) -> Result<ResolvedManifest, DownloadError> {
    let mut current = Url::parse(manifest_url)
        .map_err(|e| DownloadError::invalid_url(manifest_url, e.to_string()))?;

    for _ in 0..config.max_variant_depth {
        let body = fetch_manifest(client, config, &current).await?;

        match parse_playlist_res(&body) {
            Ok(Playlist::MasterPlaylist(master)) => {
                let variant = select_max_resolution(&master).ok_or_else(|| {
                    DownloadError::manifest_parse(current.as_str(), "master playlist has no variants")
                })?;
                let next = current.join(&variant.uri).map_err(|e| {
                    DownloadError::manifest_parse(
                        current.as_str(),
                        format!("could not join variant URI `{}`: {e}", variant.uri),
                    )
                })?;
                debug!(
                    variant = %variant.uri,
                    resolution = ?variant.resolution,
                    "selected max-resolution variant"
                );
                current = next;
            }
            Ok(Playlist::MediaPlaylist(media)) => {
                let base_url = current.join(".").map_err(|e| {
                    DownloadError::manifest_parse(
                        current.as_str(),
                        format!("could not derive base URL: {e}"),
                    )
                })?;
                debug!(url = %current, base = %base_url, segments = media.segments.len(), "resolved media playlist");
                return Ok(ResolvedManifest {
                    segments: media
                        .segments
                        .iter()
                        .map(|s| SegmentRef { uri: s.uri.clone() })
                        .collect(),
                    url: current,
                    base_url,
                });
            }
            Err(e) => {
                return Err(DownloadError::manifest_parse(current.as_str(), e.to_string()));
            }
        }
    }

    Err(DownloadError::manifest_parse(
        manifest_url,
        format!(
            "variant indirection exceeded {} levels (cyclic master playlist?)",
            config.max_variant_depth
        ),
    ))
}

/// Pick the variant with the largest pixel area. Variants without a declared
/// resolution count as zero area; the first-declared variant wins ties.
pub fn select_max_resolution(master: &MasterPlaylist) -> Option<&VariantStream> {
    let mut best: Option<(&VariantStream, u64)> = None;
    for variant in &master.variants {
        let area = variant
            .resolution
            .as_ref()
            .map(|r| r.width * r.height)
            .unwrap_or(0);
        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((variant, area));
        }
    }
    best.map(|(variant, _)| variant)
}

async fn fetch_manifest(
    client: &Client,
    config: &DownloaderConfig,
    url: &Url,
) -> Result<Vec<u8>, DownloadError> {
    let response = client
        .get(url.clone())
        .timeout(config.manifest_timeout)
        .send()
        .await
        .map_err(|e| DownloadError::ManifestFetch {
            url: url.to_string(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::HttpStatus {
            status,
            url: url.to_string(),
            operation: "manifest fetch",
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DownloadError::ManifestFetch {
            url: url.to_string(),
            source: e,
        })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_master(input: &str) -> MasterPlaylist {
        match parse_playlist_res(input.as_bytes()).expect("playlist should parse") {
            Playlist::MasterPlaylist(pl) => pl,
            Playlist::MediaPlaylist(_) => panic!("expected master playlist"),
        }
    }

    #[test]
    fn selects_largest_area_variant() {
        let master = parse_master(
            "#EXTM3U\n\
             #EXT-X-STREAM-INF:BANDWIDTH=400000,RESOLUTION=320x240\n\
             low.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720\n\
             hi.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x480\n\
             mid.m3u8\n",
        );
        let selected = select_max_resolution(&master).expect("variant selected");
        assert_eq!(selected.uri, "hi.m3u8");
    }

    #[test]
    fn equal_resolutions_pick_first_declared() {
        let master = parse_master(
            "#EXTM3U\n\
             #EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=1280x720\n\
             first.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1280x720\n\
             second.m3u8\n",
        );
        let selected = select_max_resolution(&master).expect("variant selected");
        assert_eq!(selected.uri, "first.m3u8");
    }

    #[test]
    fn missing_resolution_counts_as_zero() {
        let master = parse_master(
            "#EXTM3U\n\
             #EXT-X-STREAM-INF:BANDWIDTH=5000000\n\
             no-res.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=400000,RESOLUTION=320x240\n\
             tiny.m3u8\n",
        );
        let selected = select_max_resolution(&master).expect("variant selected");
        assert_eq!(selected.uri, "tiny.m3u8");
    }

    #[test]
    fn media_playlist_segments_preserve_declaration_order() {
        let input = "#EXTM3U\n\
                     #EXT-X-VERSION:3\n\
                     #EXT-X-TARGETDURATION:4\n\
                     #EXTINF:4.0,\nseg2.ts\n\
                     #EXTINF:4.0,\nseg0.ts\n\
                     #EXTINF:4.0,\nseg1.ts\n\
                     #EXT-X-ENDLIST\n";
        let media = match parse_playlist_res(input.as_bytes()).expect("parse") {
            Playlist::MediaPlaylist(pl) => pl,
            Playlist::MasterPlaylist(_) => panic!("expected media playlist"),
        };
        let uris: Vec<&str> = media.segments.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["seg2.ts", "seg0.ts", "seg1.ts"]);
    }
}
