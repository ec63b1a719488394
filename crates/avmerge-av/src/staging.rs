//! Staged output files.
//!
//! The tool writes into a hidden temporary file next to the destination. Only
//! a successful merge renames it into place, so an interrupted or failed merge
//! never leaves a truncated file at the final path. Dropping a
//! [`StagedOutput`] without finalizing removes the temporary file.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Prefix for staging files; the scanner skips dot-files so these are never
/// picked up as inputs.
pub const STAGING_PREFIX: &str = ".avmerge-";

/// A temporary file that becomes `destination` on success.
///
/// # Example
///
/// ```no_run
/// use avmerge_av::StagedOutput;
///
/// let staged = StagedOutput::new("/videos/talk_merged.mp4")?;
/// // run the tool with staged.path() as its output ...
/// staged.finalize(false)?;
/// # Ok::<(), avmerge_av::Error>(())
/// ```
#[derive(Debug)]
pub struct StagedOutput {
    temp: TempPath,
    destination: PathBuf,
}

impl StagedOutput {
    /// Create the staging file in the destination's directory, keeping its
    /// extension so the tool picks the right container.
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let suffix = destination
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| Error::Staging(format!("cannot create staging file in {dir:?}: {e}")))?
            .into_temp_path();

        Ok(Self { temp, destination })
    }

    /// Path the tool should write to.
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// Move the staged file to its destination.
    ///
    /// With `overwrite` false an existing destination is left untouched and
    /// an `AlreadyExists` I/O error is returned.
    pub fn finalize(self, overwrite: bool) -> Result<PathBuf> {
        let destination = self.destination;
        let persisted = if overwrite {
            self.temp.persist(&destination)
        } else {
            self.temp.persist_noclobber(&destination)
        };

        persisted.map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                Error::Io(e.error)
            } else {
                Error::Staging(format!("cannot move output to {destination:?}: {}", e.error))
            }
        })?;

        Ok(destination)
    }
}
