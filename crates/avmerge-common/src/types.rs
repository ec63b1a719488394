//! Core type definitions for discovered files, matches, and job states.
//!
//! Enums serialize in lowercase so `--json` output stays stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Whether a file carries the picture or the sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// A media file found during discovery. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File name without its extension.
    pub base_name: String,
    /// Lowercased extension without the leading dot.
    pub extension: String,
    pub kind: MediaKind,
    /// Size in bytes at discovery time.
    pub size: u64,
}

impl MediaFile {
    /// File name including the extension, for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.base_name, self.extension))
    }
}

/// How a video/audio pair was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Normalized names are identical.
    Exact,
    /// Names are similar enough to clear the threshold.
    Fuzzy,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Lifecycle state of a merge job.
///
/// `Pending` and `Running` are the only non-terminal states. Once a job
/// reaches any other state it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Output already existed and overwriting was disabled.
    Skipped,
    Cancelled,
}

impl JobState {
    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Skipped.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&JobState::Skipped).unwrap();
        assert_eq!(json, format!("\"{}\"", JobState::Skipped));

        let json = serde_json::to_string(&MatchKind::Fuzzy).unwrap();
        assert_eq!(json, "\"fuzzy\"");

        let json = serde_json::to_string(&MediaKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }

    #[test]
    fn test_media_file_name() {
        let file = MediaFile {
            path: PathBuf::from("/media/Lecture 01.mp4"),
            base_name: "Lecture 01".to_string(),
            extension: "mp4".to_string(),
            kind: MediaKind::Video,
            size: 42,
        };
        assert_eq!(file.file_name(), "Lecture 01.mp4");
    }
}
