//! Duration probing.
//!
//! With an ffprobe-compatible tool available the format duration is read from
//! its JSON output. Otherwise the merge tool itself is asked to open the input
//! and its `Duration:` banner line is parsed from stderr.

use crate::progress::parse_duration_banner;
use crate::{Error, Result, ToolCommand};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Determine the duration of `media`.
///
/// `probe_tool` is preferred when set; `tool` is the merge tool used for the
/// banner fallback. Both paths are bounded by `timeout`.
pub async fn probe_duration(
    tool: &Path,
    probe_tool: Option<&Path>,
    media: &Path,
    timeout: Duration,
) -> Result<Duration> {
    match probe_tool {
        Some(ffprobe) => probe_with_ffprobe(ffprobe, media, timeout).await,
        None => probe_with_banner(tool, media, timeout).await,
    }
}

async fn probe_with_ffprobe(ffprobe: &Path, media: &Path, timeout: Duration) -> Result<Duration> {
    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(media)
        .timeout(timeout)
        .execute()
        .await?;

    parse_ffprobe_duration(&output.stdout)
}

/// Extract `format.duration` from ffprobe's JSON output.
pub fn parse_ffprobe_duration(json: &str) -> Result<Duration> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;
    let seconds = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| Error::parse_error("ffprobe", "no format.duration in output"))?;

    let seconds: f64 = seconds
        .trim()
        .parse()
        .map_err(|_| Error::parse_error("ffprobe", format!("invalid duration {seconds:?}")))?;

    Duration::try_from_secs_f64(seconds)
        .map_err(|_| Error::parse_error("ffprobe", format!("invalid duration {seconds}")))
}

async fn probe_with_banner(tool: &Path, media: &Path, timeout: Duration) -> Result<Duration> {
    // Exits non-zero because no output is given; only the banner matters.
    let mut command = ToolCommand::new(tool.to_path_buf());
    command
        .args(["-hide_banner", "-nostdin", "-i"])
        .arg(media)
        .timeout(timeout);
    let output = command.output().await?;

    output
        .stderr
        .lines()
        .find_map(parse_duration_banner)
        .ok_or_else(|| {
            Error::parse_error(
                command.program_name(),
                format!("no Duration line for {}", media.display()),
            )
        })
}
