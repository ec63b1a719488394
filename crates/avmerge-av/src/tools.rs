//! External tool detection and validation.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Directories searched when a tool is neither configured nor on `PATH`.
#[cfg(unix)]
const COMMON_TOOL_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/usr/bin",
    "/opt/homebrew/bin",
    "/opt/local/bin",
    "/snap/bin",
];

#[cfg(windows)]
const COMMON_TOOL_DIRS: &[&str] = &[
    "C:\\ffmpeg\\bin",
    "C:\\Program Files\\ffmpeg\\bin",
    "C:\\Program Files (x86)\\ffmpeg\\bin",
];

#[cfg(not(any(unix, windows)))]
const COMMON_TOOL_DIRS: &[&str] = &[];

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name or path the tool was checked under.
    pub name: String,
    /// Whether the tool ran and reported a version.
    pub available: bool,
    /// First line of the `-version` output.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available by running `<tool> -version`.
///
/// `tool` may be a bare name looked up on `PATH` or a full path.
///
/// # Example
///
/// ```no_run
/// use avmerge_av::check_tool;
///
/// let info = check_tool("ffmpeg");
/// if info.available {
///     println!("ffmpeg version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(tool: &str) -> ToolInfo {
    check_tool_with_arg(tool, "-version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(tool: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(tool).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: tool.to_string(),
                available: true,
                version,
                path: which::which(tool).ok(),
            }
        }
        Ok(output) => {
            tracing::debug!("{} {} exited with {}", tool, version_arg, output.status);
            unavailable(tool)
        }
        Err(e) => {
            tracing::debug!("{} could not be started: {}", tool, e);
            unavailable(tool)
        }
    }
}

fn unavailable(tool: &str) -> ToolInfo {
    ToolInfo {
        name: tool.to_string(),
        available: false,
        version: None,
        path: None,
    }
}

/// Ensure `path` names an existing, executable regular file.
///
/// This only inspects the filesystem; the tool is not run.
pub fn validate_executable(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|_| Error::file_not_found(path))?;
    if !metadata.is_file() {
        return Err(Error::NotExecutable {
            path: path.to_path_buf(),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            return Err(Error::NotExecutable {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Find a tool: the configured path first, then `PATH`, then common install
/// directories.
///
/// An unusable configured path is logged and skipped rather than treated as
/// fatal, so a stale config entry does not hide a working install.
pub fn locate_tool(name: &str, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        match validate_executable(path) {
            Ok(()) => return Ok(path.to_path_buf()),
            Err(e) => tracing::warn!("Configured {} is unusable: {}", name, e),
        }
    }

    if let Ok(path) = which::which(name) {
        tracing::debug!("Found {} on PATH at {:?}", name, path);
        return Ok(path);
    }

    let file_name = if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    };

    COMMON_TOOL_DIRS
        .iter()
        .map(|dir| Path::new(dir).join(&file_name))
        .find(|candidate| validate_executable(candidate).is_ok())
        .inspect(|path| tracing::debug!("Found {} at {:?}", name, path))
        .ok_or_else(|| Error::tool_not_found(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("nonexistent_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_executable(&dir.path().join("ffmpeg")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_executable(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotExecutable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_permission_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("ffmpeg");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(
            validate_executable(&tool),
            Err(Error::NotExecutable { .. })
        ));

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(validate_executable(&tool).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_prefers_configured_path() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("my-ffmpeg");
        std::fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = locate_tool("my-ffmpeg", Some(&tool)).unwrap();
        assert_eq!(found, tool);
    }

    #[test]
    fn test_locate_unknown_tool() {
        let err = locate_tool("nonexistent_tool_12345", None).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }
}
