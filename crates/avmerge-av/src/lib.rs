//! # avmerge-av
//!
//! Everything avmerge knows about the external media tool lives here.
//!
//! This crate provides functionality for:
//! - Locating and validating an ffmpeg-compatible executable
//! - Running it with bounded time ([`ToolCommand`])
//! - Probing input duration (ffprobe JSON or the ffmpeg banner)
//! - Parsing progress lines into [`ProgressUpdate`]s
//! - Building merge argument lists ([`MergeCommand`])
//! - Staging outputs so partial files never appear at the final path
//!
//! ## Example
//!
//! ```
//! use avmerge_av::{parse_progress_line, ProgressUpdate};
//! use std::time::Duration;
//!
//! assert_eq!(
//!     parse_progress_line("out_time_us=2500000"),
//!     Some(ProgressUpdate::Time(Duration::from_micros(2_500_000)))
//! );
//! assert_eq!(parse_progress_line("bitrate=128.0kbits/s"), None);
//! ```

pub mod command;
mod error;
pub mod merge;
pub mod probe;
pub mod progress;
pub mod staging;
pub mod tools;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use merge::MergeCommand;
pub use probe::probe_duration;
pub use progress::{parse_progress_line, ProgressUpdate};
pub use staging::StagedOutput;
pub use tools::{check_tool, locate_tool, validate_executable, ToolInfo};
