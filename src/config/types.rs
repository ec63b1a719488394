use crate::matcher::{NormalizeOptions, DEFAULT_THRESHOLD};
use crate::merge::{DEFAULT_DIAGNOSTIC_LINES, DEFAULT_MAX_WORKERS, DEFAULT_SUFFIX};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg (found on PATH or in common locations if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to ffprobe, used for duration probes when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffprobe: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Directory scanned when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    /// Descend into subdirectories
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Minimum similarity (0.0 - 1.0) for a fuzzy match
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub normalize: NormalizeOptions,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            normalize: NormalizeOptions::default(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MergeConfig {
    /// Output directory (next to each video if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Appended to the video name to form the output name
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Replace existing outputs instead of skipping them
    #[serde(default)]
    pub overwrite: bool,

    /// Number of merges run at the same time
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Stop at the end of the shorter input
    #[serde(default = "default_true")]
    pub shortest: bool,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Stop a merge that prints nothing for this long (0 disables)
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout_secs: u64,

    /// Seconds between asking a cancelled merge to stop and killing it
    #[serde(default = "default_cancel_grace")]
    pub cancel_grace_secs: u64,

    /// Trailing stderr lines kept for failed merges
    #[serde(default = "default_diagnostic_lines")]
    pub diagnostic_lines: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            suffix: default_suffix(),
            overwrite: false,
            max_workers: default_max_workers(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            shortest: true,
            probe_timeout_secs: default_probe_timeout(),
            stall_timeout_secs: default_stall_timeout(),
            cancel_grace_secs: default_cancel_grace(),
            diagnostic_lines: default_diagnostic_lines(),
        }
    }
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_video_codec() -> String {
    "copy".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_true() -> bool {
    true
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_stall_timeout() -> u64 {
    300
}

fn default_cancel_grace() -> u64 {
    5
}

fn default_diagnostic_lines() -> usize {
    DEFAULT_DIAGNOSTIC_LINES
}
