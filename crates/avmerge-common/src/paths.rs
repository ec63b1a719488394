//! Path utilities for classifying media files by extension.
//!
//! Matching is case-insensitive: `Movie.MP4` is a video just like `movie.mp4`.

use crate::MediaKind;
use std::path::Path;

/// List of recognised video container extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"];

/// List of recognised audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "aac", "wav", "flac", "ogg", "wma", "mka"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use avmerge_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("lecture.mkv")));
/// assert!(is_video_file(Path::new("/path/to/CLIP.MP4")));
/// assert!(!is_video_file(Path::new("track.m4a")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Check if a path has an audio file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use avmerge_common::paths::is_audio_file;
///
/// assert!(is_audio_file(Path::new("track.m4a")));
/// assert!(is_audio_file(Path::new("dub.MKA")));
/// assert!(!is_audio_file(Path::new("lecture.mkv")));
/// ```
pub fn is_audio_file(path: &Path) -> bool {
    lowercase_extension(path)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Classify a path as video, audio, or neither.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    if is_video_file(path) {
        Some(MediaKind::Video)
    } else if is_audio_file(path) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of audio file extensions.
#[must_use]
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}
