//! Filename normalization.
//!
//! Turns a base name into the key used for comparison: case-folded, split on
//! delimiter characters, optionally with quality tags removed, then rejoined.

use avmerge_common::{paths::media_kind, Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tokens treated as quality or release tags when tag stripping is on.
const BUILTIN_TAGS: &str = concat!(
    r"\d{3,4}[pi]|[248]k|uhd|hdr|hdr10|sdr|",
    r"x26[45]|h26[45]|hevc|avc|av1|aac|ac3|eac3|dts|",
    r"webrip|webdl|bluray|bdrip|hdtv|remux"
);

fn default_delimiters() -> String {
    "_-. ".to_string()
}

/// What happens to delimiter characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelimiterMode {
    /// Runs of delimiters become a single space.
    #[default]
    Collapse,
    /// Delimiters are dropped entirely, joining the words.
    Remove,
}

/// Knobs for [`Normalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    #[serde(default)]
    pub delimiter_mode: DelimiterMode,

    /// Characters that separate words.
    #[serde(default = "default_delimiters")]
    pub delimiters: String,

    /// Drop whole tokens that look like quality tags (`1080p`, `x264`, ...).
    #[serde(default)]
    pub strip_tags: bool,

    /// Extra tag patterns, matched against whole lowercase tokens.
    #[serde(default)]
    pub extra_tags: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            delimiter_mode: DelimiterMode::default(),
            delimiters: default_delimiters(),
            strip_tags: false,
            extra_tags: Vec::new(),
        }
    }
}

/// Builds normalized keys according to a fixed set of options.
#[derive(Debug, Clone)]
pub struct Normalizer {
    options: NormalizeOptions,
    tags: Option<Regex>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            options: NormalizeOptions::default(),
            tags: None,
        }
    }
}

impl Normalizer {
    /// Create a normalizer. Fails only if an extra tag pattern is not a valid
    /// regular expression.
    pub fn new(options: NormalizeOptions) -> Result<Self> {
        let tags = if options.strip_tags {
            let mut alternatives = vec![BUILTIN_TAGS.to_string()];
            alternatives.extend(options.extra_tags.iter().map(|t| format!("(?:{t})")));
            let pattern = format!("(?i)^(?:{})$", alternatives.join("|"));
            let regex = Regex::new(&pattern)
                .map_err(|e| Error::invalid_input(format!("invalid tag pattern: {e}")))?;
            Some(regex)
        } else {
            None
        };

        Ok(Self { options, tags })
    }

    fn is_tag(&self, token: &str) -> bool {
        self.tags.as_ref().is_some_and(|re| re.is_match(token))
    }

    /// Normalize a base name (no extension).
    pub fn normalize(&self, name: &str) -> String {
        let folded = name.to_lowercase();
        let tokens: Vec<&str> = folded
            .split(|c: char| self.options.delimiters.contains(c))
            .filter(|t| !t.is_empty())
            .collect();

        let kept: Vec<&str> = tokens.iter().copied().filter(|t| !self.is_tag(t)).collect();
        // A name made only of tags keeps them; an empty key would equal
        // every other empty key.
        let tokens = if kept.is_empty() { tokens } else { kept };

        match self.options.delimiter_mode {
            DelimiterMode::Collapse => tokens.join(" "),
            DelimiterMode::Remove => tokens.concat(),
        }
    }

    /// Normalize a full file name, dropping a recognised media extension.
    pub fn normalize_file_name(&self, file_name: &str) -> String {
        self.normalize(strip_media_extension(file_name))
    }
}

/// Remove a trailing video or audio extension; other dots are kept, so
/// `Part 1.5` stays intact.
fn strip_media_extension(file_name: &str) -> &str {
    let path = Path::new(file_name);
    match (media_kind(path), file_name.rfind('.')) {
        (Some(_), Some(dot)) => &file_name[..dot],
        _ => file_name,
    }
}

/// Normalize with default options.
///
/// # Examples
///
/// ```
/// use avmerge::matcher::normalize;
///
/// assert_eq!(normalize("My_Video-01"), "my video 01");
/// assert_eq!(normalize("My Video 01"), normalize("my.video.01"));
/// ```
pub fn normalize(name: &str) -> String {
    Normalizer::default().normalize(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripping(extra: &[&str]) -> Normalizer {
        Normalizer::new(NormalizeOptions {
            strip_tags: true,
            extra_tags: extra.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_case_and_delimiters() {
        assert_eq!(normalize("Lecture_01"), "lecture 01");
        assert_eq!(normalize("  lecture -- 01 "), "lecture 01");
        assert_eq!(normalize("LECTURE.01"), normalize("lecture 01"));
        assert_eq!(normalize("Ünïcode_Name"), "ünïcode name");
    }

    #[test]
    fn test_remove_mode() {
        let normalizer = Normalizer::new(NormalizeOptions {
            delimiter_mode: DelimiterMode::Remove,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(normalizer.normalize("my_video-01"), "myvideo01");
        assert_eq!(normalizer.normalize("My Video 01"), "myvideo01");
    }

    #[test]
    fn test_tags_kept_by_default() {
        assert_eq!(normalize("video_1080p"), "video 1080p");
    }

    #[test]
    fn test_strip_tags() {
        let normalizer = stripping(&[]);
        assert_eq!(normalizer.normalize("Trip.2160p.HEVC.x265"), "trip");
        assert_eq!(normalizer.normalize("video_1080p"), "video");
        // Free-form words survive.
        assert_eq!(normalizer.normalize("hdr-talk part 2"), "talk part 2");
    }

    #[test]
    fn test_strip_tags_never_empties_key() {
        assert_eq!(stripping(&[]).normalize("1080p"), "1080p");
    }

    #[test]
    fn test_extra_tags() {
        let normalizer = stripping(&["final", "v\\d+"]);
        assert_eq!(normalizer.normalize("Demo_v3_FINAL"), "demo");
    }

    #[test]
    fn test_invalid_extra_tag_pattern() {
        let err = Normalizer::new(NormalizeOptions {
            strip_tags: true,
            extra_tags: vec!["(unclosed".to_string()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_normalize_file_name() {
        let normalizer = Normalizer::default();
        assert_eq!(normalizer.normalize_file_name("Clip_A.MP4"), "clip a");
        assert_eq!(normalizer.normalize_file_name("Part 1.5"), "part 1 5");
        assert_eq!(normalizer.normalize_file_name("notes.txt"), "notes txt");
    }
}
