//! Parsing of the tool's progress output.
//!
//! ffmpeg run with `-progress pipe:1` prints `key=value` lines, one block per
//! update, ending in `progress=continue` or `progress=end`. Older builds, and
//! runs without `-progress`, only print stats lines such as
//! `frame=  240 fps= 60 ... time=00:00:10.00 bitrate=...` on stderr. Both are
//! understood here. Anything else yields `None`.

use std::time::Duration;

/// A single piece of progress information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Media time processed so far.
    Time(Duration),
    /// The tool reported it has finished writing.
    End,
}

/// Parse one output line.
///
/// `out_time_ms` is in microseconds despite its name; ffmpeg has always
/// emitted it that way.
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        let value = value.trim();
        match key.trim() {
            "out_time_us" | "out_time_ms" => {
                return value
                    .parse::<u64>()
                    .ok()
                    .map(|us| ProgressUpdate::Time(Duration::from_micros(us)));
            }
            "out_time" => return parse_timestamp(value).map(ProgressUpdate::Time),
            "progress" => {
                return (value == "end").then_some(ProgressUpdate::End);
            }
            _ => {}
        }
    }

    line.split_whitespace()
        .find_map(|token| token.strip_prefix("time="))
        .and_then(parse_timestamp)
        .map(ProgressUpdate::Time)
}

/// Parse the `Duration: HH:MM:SS.ss, start: ...` line of ffmpeg's input banner.
pub fn parse_duration_banner(line: &str) -> Option<Duration> {
    let (_, rest) = line.split_once("Duration:")?;
    let value = rest.split(',').next()?.trim();
    parse_timestamp(value)
}

/// Parse `HH:MM:SS[.fraction]`.
///
/// Negative or `N/A` values, which ffmpeg prints before the first packet,
/// return `None`.
pub fn parse_timestamp(value: &str) -> Option<Duration> {
    let mut parts = value.splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds = parts.next()?;

    let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: u64 = whole.parse().ok()?;
    if minutes >= 60 || whole >= 60 {
        return None;
    }

    let mut nanos = 0u32;
    if !fraction.is_empty() {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = &fraction[..fraction.len().min(9)];
        let scale = 10u32.pow(9 - digits.len() as u32);
        nanos = digits.parse::<u32>().ok()? * scale;
    }

    let secs = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_add(whole)?;
    Some(Duration::new(secs, nanos))
}

/// Fraction of `total` covered by `elapsed`, clamped to `0.0..=1.0`.
///
/// An unknown or zero total gives no information, so the result is 0.0.
pub fn fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}
