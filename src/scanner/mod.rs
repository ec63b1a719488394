//! Source directory scanner.
//!
//! Discovers video and audio files in a directory, top-level only unless
//! recursion is requested. Results come back in a deterministic order
//! (directory walk with entries sorted by file name) which the matcher relies
//! on for its tie-breaking.

use avmerge_common::{paths::media_kind, Error, MediaFile, MediaKind, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Bonus added when a folder holds both videos and audios.
const BOTH_KINDS_BONUS: usize = 100;

/// Folders probed by [`suggest_source_dir`] when nothing is configured.
const CANDIDATE_DIRS: &[&str] = &["~/Downloads", "~/Desktop", "~/Videos", "~/Movies"];

/// Files found by a scan, split by kind, each list in scan order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub videos: Vec<MediaFile>,
    pub audios: Vec<MediaFile>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.audios.is_empty()
    }

    pub fn total(&self) -> usize {
        self.videos.len() + self.audios.len()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Scan `dir` for media files.
///
/// Hidden entries (including in-progress staging files) are ignored.
/// Unreadable subdirectories are logged and skipped; an unreadable `dir`
/// itself is a [`Error::Discovery`].
pub fn scan(dir: &Path, recursive: bool) -> Result<ScanResult> {
    let root = dir
        .canonicalize()
        .map_err(|e| Error::discovery(dir, e))?;
    std::fs::read_dir(&root).map_err(|e| Error::discovery(&root, e))?;

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut result = ScanResult::default();

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(file) = media_file(entry.path()) {
            debug!("Found {} {:?}", file.kind, file.path);
            match file.kind {
                MediaKind::Video => result.videos.push(file),
                MediaKind::Audio => result.audios.push(file),
            }
        }
    }

    info!(
        "Scanned {:?}: {} videos, {} audios",
        root,
        result.videos.len(),
        result.audios.len()
    );

    Ok(result)
}

/// Build a [`MediaFile`] for `path`, or `None` if it is not a media file.
pub fn media_file(path: &Path) -> Option<MediaFile> {
    let kind = media_kind(path)?;
    let base_name = path.file_stem()?.to_string_lossy().into_owned();
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    Some(MediaFile {
        path: path.to_path_buf(),
        base_name,
        extension,
        kind,
        size,
    })
}

/// Default folders considered by [`suggest_source_dir`], tilde-expanded.
pub fn default_candidate_dirs() -> Vec<PathBuf> {
    CANDIDATE_DIRS
        .iter()
        .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
        .collect()
}

/// Pick the candidate folder most likely to hold pairs to merge.
///
/// Each readable folder scores its top-level media count, plus a bonus when
/// both videos and audios are present. Folders without media are never
/// suggested. The earlier candidate wins ties.
pub fn suggest_source_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    let mut best: Option<(usize, &PathBuf)> = None;

    for dir in candidates.iter().filter(|d| d.is_dir()) {
        let Ok(found) = scan(dir, false) else {
            continue;
        };
        let mut score = found.total();
        if !found.videos.is_empty() && !found.audios.is_empty() {
            score += BOTH_KINDS_BONUS;
        }
        debug!("Candidate {:?} scored {}", dir, score);

        if score > 0 && best.map(|(s, _)| score > s).unwrap_or(true) {
            best = Some((score, dir));
        }
    }

    best.map(|(_, dir)| dir.clone())
}
