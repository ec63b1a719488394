use avmerge_common::{Error, MediaFile, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SUFFIX: &str = "_merged";
pub const DEFAULT_MAX_WORKERS: usize = 2;
pub const DEFAULT_DIAGNOSTIC_LINES: usize = 20;

/// Where merged files are written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputPlacement {
    /// Next to the source video.
    #[default]
    BesideSource,
    /// In one directory, created on demand.
    Directory(PathBuf),
}

/// Everything the runner needs to execute a batch.
#[derive(Debug, Clone)]
pub struct MergeSettings {
    /// ffmpeg-compatible executable.
    pub tool_path: PathBuf,
    /// Optional ffprobe-compatible executable for duration probes.
    pub probe_path: Option<PathBuf>,
    pub placement: OutputPlacement,
    /// Appended to the video's base name.
    pub suffix: String,
    pub overwrite: bool,
    pub max_workers: usize,
    pub video_codec: String,
    pub audio_codec: String,
    pub shortest: bool,
    pub probe_timeout: Duration,
    /// Kill a merge that prints nothing for this long. `None` disables.
    pub stall_timeout: Option<Duration>,
    /// Time allowed between the termination request and a forced kill.
    pub cancel_grace: Duration,
    /// Trailing stderr lines kept for failed jobs.
    pub diagnostic_lines: usize,
}

impl MergeSettings {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            probe_path: None,
            placement: OutputPlacement::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            overwrite: false,
            max_workers: DEFAULT_MAX_WORKERS,
            video_codec: "copy".to_string(),
            audio_codec: "aac".to_string(),
            shortest: true,
            probe_timeout: Duration::from_secs(30),
            stall_timeout: Some(Duration::from_secs(300)),
            cancel_grace: Duration::from_secs(5),
            diagnostic_lines: DEFAULT_DIAGNOSTIC_LINES,
        }
    }

    /// Reject settings that cannot run at all.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::invalid_input("max_workers must be at least 1"));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(Error::invalid_input("codec names must not be empty"));
        }
        Ok(())
    }

    /// `<video base name><suffix><video extension>` in the configured place.
    pub fn output_path_for(&self, video: &MediaFile) -> PathBuf {
        let file_name = format!("{}{}.{}", video.base_name, self.suffix, video.extension);
        let dir: &Path = match &self.placement {
            OutputPlacement::BesideSource => video.path.parent().unwrap_or(Path::new(".")),
            OutputPlacement::Directory(dir) => dir,
        };
        dir.join(file_name)
    }
}
