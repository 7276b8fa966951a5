//! Video key derivation from playlist manifest paths
//!
//! HLS output for a source asset `owner/video.mp4` is published under
//! `/owner/video/.../master.m3u8`. The key reconstructs the source asset name
//! from the first two directory components of the manifest path.

use http::Uri;
use nutype::nutype;
use std::borrow::Cow;

/// File name of the adaptive-bitrate playlist manifest
pub const MANIFEST_FILENAME: &str = "master.m3u8";

/// Extension of the source asset a playlist was transcoded from
pub const SOURCE_EXTENSION: &str = ".mp4";

/// Canonical identifier correlating view counts with a source asset
#[nutype(
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct VideoKey(String);

/// Derive the video key for a request path.
///
/// Any path ending in the manifest file name is a manifest request. The
/// `/master.m3u8` suffix is dropped and the remainder split on `/`; the
/// first two segments, empty or not, name the source asset. Fewer than two
/// segments yields `None`.
pub fn derive_video_key(path: &str) -> Option<VideoKey> {
    if !path.ends_with(MANIFEST_FILENAME) {
        return None;
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let directory = trimmed
        .strip_suffix(MANIFEST_FILENAME)
        .and_then(|rest| rest.strip_suffix('/'))
        .unwrap_or(trimmed);

    let mut segments = directory.split('/');
    let owner = segments.next()?;
    let video = segments.next()?;

    VideoKey::try_new(format!("{owner}/{video}{SOURCE_EXTENSION}")).ok()
}

/// Derive the video key for a request URI, percent-decoding its path first.
///
/// Undecodable paths fall back to the raw path. The query is never consulted.
pub fn manifest_video_key(uri: &Uri) -> Option<VideoKey> {
    let raw = uri.path();
    let path = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    derive_video_key(&path)
}
