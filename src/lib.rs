//! avmerge - pair video files with their audio tracks and merge them
//!
//! This library crate exposes the scanner, matcher and merge runner used by
//! the `avmerge` binary, and for integration testing.

pub mod config;
pub mod matcher;
pub mod merge;
pub mod scanner;
pub mod state;
