//! avmerge-common: Shared types, constants, and errors.
//!
//! This crate provides the vocabulary used across avmerge:
//!
//! - **Typed IDs**: UUID wrappers for batches and merge jobs
//! - **Core Types**: media kinds, discovered files, match kinds, job states
//! - **Path Utilities**: classify files as video or audio by extension
//! - **Error Handling**: the error taxonomy shared by scanning and merging
//!
//! # Examples
//!
//! ```
//! use avmerge_common::{JobId, JobState, MediaKind, Error, Result};
//! use avmerge_common::paths::media_kind;
//! use std::path::Path;
//!
//! let job_id = JobId::new();
//! assert!(!JobState::Pending.is_terminal());
//!
//! assert_eq!(media_kind(Path::new("clip.mkv")), Some(MediaKind::Video));
//! assert_eq!(media_kind(Path::new("clip.m4a")), Some(MediaKind::Audio));
//!
//! fn example() -> Result<()> {
//!     Err(Error::invalid_input("max_workers must be at least 1"))
//! }
//! # let _ = (job_id, example());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
