//! Video/audio pairing.
//!
//! Matching runs in two passes over files in scan order:
//!
//! 1. **Exact**: each video takes the first unused audio whose normalized key
//!    is identical (score 1.0).
//! 2. **Fuzzy**: every remaining video/audio combination scoring at or above
//!    the threshold is a candidate. Candidates are committed best-first,
//!    ties broken by video scan order and then audio scan order, skipping any
//!    whose video or audio is already taken.
//!
//! The fuzzy pass is greedy, not a globally optimal assignment: one very
//! strong pair can take a file that two weaker pairs would otherwise have
//! shared out.

pub mod normalize;
pub mod similarity;

pub use normalize::{normalize, DelimiterMode, NormalizeOptions, Normalizer};
pub use similarity::similarity;

use avmerge_common::{MatchKind, MediaFile};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Default similarity threshold for fuzzy matches.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// One video bound to one audio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPair {
    pub video: MediaFile,
    pub audio: MediaFile,
    pub score: f64,
    pub kind: MatchKind,
}

/// Outcome of a matching pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchResult {
    /// Pairs ordered by the video's scan order.
    pub pairs: Vec<MatchPair>,
    pub unmatched_videos: Vec<MediaFile>,
    pub unmatched_audios: Vec<MediaFile>,
}

impl MatchResult {
    pub fn exact_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.kind == MatchKind::Exact).count()
    }

    pub fn fuzzy_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.kind == MatchKind::Fuzzy).count()
    }
}

struct Candidate {
    video: usize,
    audio: usize,
    score: f64,
}

/// Pair `videos` with `audios`.
///
/// Both slices must be in scan order; that order decides ties. Every file ends
/// up in exactly one of `pairs`, `unmatched_videos` or `unmatched_audios`.
///
/// # Examples
///
/// ```
/// use avmerge::matcher::{match_files, Normalizer};
/// use avmerge::scanner::media_file;
/// use std::path::Path;
///
/// // Files need not exist for matching; sizes just read as zero.
/// let videos = vec![media_file(Path::new("/in/Intro.mp4")).unwrap()];
/// let audios = vec![media_file(Path::new("/in/intro.m4a")).unwrap()];
///
/// let result = match_files(&videos, &audios, 0.8, &Normalizer::default());
/// assert_eq!(result.pairs.len(), 1);
/// assert_eq!(result.exact_count(), 1);
/// ```
pub fn match_files(
    videos: &[MediaFile],
    audios: &[MediaFile],
    threshold: f64,
    normalizer: &Normalizer,
) -> MatchResult {
    let video_keys: Vec<String> = videos
        .iter()
        .map(|v| normalizer.normalize(&v.base_name))
        .collect();
    let audio_keys: Vec<String> = audios
        .iter()
        .map(|a| normalizer.normalize(&a.base_name))
        .collect();

    // audio index chosen for each video
    let mut video_match: Vec<Option<(usize, f64, MatchKind)>> = vec![None; videos.len()];
    let mut audio_used = vec![false; audios.len()];

    for (vi, vkey) in video_keys.iter().enumerate() {
        let exact = audio_keys
            .iter()
            .enumerate()
            .find(|(ai, akey)| !audio_used[*ai] && *akey == vkey)
            .map(|(ai, _)| ai);
        if let Some(ai) = exact {
            audio_used[ai] = true;
            video_match[vi] = Some((ai, 1.0, MatchKind::Exact));
        }
    }

    let mut candidates = Vec::new();
    for (vi, vkey) in video_keys.iter().enumerate() {
        if video_match[vi].is_some() {
            continue;
        }
        for (ai, akey) in audio_keys.iter().enumerate() {
            if audio_used[ai] {
                continue;
            }
            let score = similarity(vkey, akey);
            if score >= threshold {
                candidates.push(Candidate {
                    video: vi,
                    audio: ai,
                    score,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.video.cmp(&b.video))
            .then(a.audio.cmp(&b.audio))
    });

    for candidate in candidates {
        if video_match[candidate.video].is_some() || audio_used[candidate.audio] {
            continue;
        }
        debug!(
            "Fuzzy match {:?} <-> {:?} ({:.3})",
            video_keys[candidate.video], audio_keys[candidate.audio], candidate.score
        );
        audio_used[candidate.audio] = true;
        video_match[candidate.video] = Some((candidate.audio, candidate.score, MatchKind::Fuzzy));
    }

    let mut result = MatchResult::default();
    for (video, matched) in videos.iter().zip(video_match) {
        match matched {
            Some((ai, score, kind)) => result.pairs.push(MatchPair {
                video: video.clone(),
                audio: audios[ai].clone(),
                score,
                kind,
            }),
            None => result.unmatched_videos.push(video.clone()),
        }
    }
    result.unmatched_audios = audios
        .iter()
        .zip(&audio_used)
        .filter(|(_, used)| !**used)
        .map(|(audio, _)| audio.clone())
        .collect();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use avmerge_common::MediaKind;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn file(name: &str) -> MediaFile {
        let (base, ext) = name.rsplit_once('.').unwrap();
        let kind = if avmerge_common::paths::video_extensions().contains(&ext) {
            MediaKind::Video
        } else {
            MediaKind::Audio
        };
        MediaFile {
            path: PathBuf::from("/media").join(name),
            base_name: base.to_string(),
            extension: ext.to_string(),
            kind,
            size: 0,
        }
    }

    fn files(names: &[&str]) -> Vec<MediaFile> {
        names.iter().map(|n| file(n)).collect()
    }

    fn run(videos: &[&str], audios: &[&str], threshold: f64) -> MatchResult {
        match_files(&files(videos), &files(audios), threshold, &Normalizer::default())
    }

    fn pair_names(result: &MatchResult) -> Vec<(String, String)> {
        result
            .pairs
            .iter()
            .map(|p| (p.video.file_name(), p.audio.file_name()))
            .collect()
    }

    #[test]
    fn test_two_exact_pairs() {
        let result = run(&["a.mp4", "b.mp4"], &["a.m4a", "b.m4a"], 0.8);
        assert_eq!(result.exact_count(), 2);
        assert_eq!(result.fuzzy_count(), 0);
        assert!(result.unmatched_videos.is_empty());
        assert!(result.unmatched_audios.is_empty());
        assert_eq!(
            pair_names(&result),
            [
                ("a.mp4".to_string(), "a.m4a".to_string()),
                ("b.mp4".to_string(), "b.m4a".to_string())
            ]
        );
    }

    #[test]
    fn test_tagged_names_pair() {
        let result = run(&["video_1080p.mp4"], &["video_1080p.m4a"], 0.8);
        assert_eq!(result.pairs.len(), 1);
        assert_eq!(result.pairs[0].kind, MatchKind::Exact);
    }

    #[test]
    fn test_empty_audio_set() {
        let result = run(&["a.mp4", "b.mp4"], &[], 0.8);
        assert!(result.pairs.is_empty());
        assert_eq!(result.unmatched_videos.len(), 2);
        assert!(result.unmatched_audios.is_empty());
    }

    #[test]
    fn test_empty_video_set() {
        let result = run(&[], &["a.m4a"], 0.8);
        assert!(result.pairs.is_empty());
        assert_eq!(result.unmatched_audios.len(), 1);
    }

    #[test]
    fn test_exact_takes_first_audio_in_scan_order() {
        let result = run(&["Clip.mp4"], &["clip.m4a", "CLIP.mp3"], 0.8);
        assert_eq!(pair_names(&result)[0].1, "clip.m4a");
        assert_eq!(result.unmatched_audios[0].file_name(), "CLIP.mp3");
    }

    #[test]
    fn test_fuzzy_respects_threshold() {
        // "lecture 01" vs "lecture 1": lcs 9, total 19 -> 0.947
        let result = run(&["lecture 01.mp4"], &["lecture 1.m4a"], 0.9);
        assert_eq!(result.fuzzy_count(), 1);
        assert!(result.pairs[0].score >= 0.9);

        let result = run(&["lecture 01.mp4"], &["lecture 1.m4a"], 0.99);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn test_exact_ignores_threshold() {
        let result = run(&["a.mp4"], &["A.m4a"], 1.0);
        assert_eq!(result.exact_count(), 1);
        assert_eq!(result.pairs[0].score, 1.0);
    }

    #[test]
    fn test_greedy_best_first() {
        let videos = ["talk 1.mp4", "talk 12.mp4"];
        let audios = ["talk 12x.m4a"];
        let result = run(&videos, &audios, 0.5);
        // "talk 12" vs "talk 12x" beats "talk 1" vs "talk 12x".
        assert_eq!(pair_names(&result), [("talk 12.mp4".to_string(), "talk 12x.m4a".to_string())]);
        assert_eq!(result.unmatched_videos[0].file_name(), "talk 1.mp4");
    }

    #[test]
    fn test_ties_go_to_earlier_video() {
        let result = run(&["ab.mp4", "ac.mp4"], &["a.m4a"], 0.5);
        // Both score 2/3; the first video in scan order wins.
        assert_eq!(pair_names(&result)[0].0, "ab.mp4");
    }

    #[test]
    fn test_injective_and_partitioned() {
        let videos = files(&[
            "ep 1.mp4", "ep 2.mp4", "ep 3.mkv", "ep 1 final.mp4", "bonus.mov", "ep2.webm",
        ]);
        let audios = files(&["ep 1.m4a", "ep 2.mp3", "ep 3 dub.aac", "ep1.wav", "ep 2.flac"]);
        let result = match_files(&videos, &audios, 0.6, &Normalizer::default());

        let used_videos: HashSet<_> = result.pairs.iter().map(|p| p.video.path.clone()).collect();
        let used_audios: HashSet<_> = result.pairs.iter().map(|p| p.audio.path.clone()).collect();
        assert_eq!(used_videos.len(), result.pairs.len());
        assert_eq!(used_audios.len(), result.pairs.len());

        assert_eq!(result.pairs.len() + result.unmatched_videos.len(), videos.len());
        assert_eq!(result.pairs.len() + result.unmatched_audios.len(), audios.len());

        for pair in &result.pairs {
            match pair.kind {
                MatchKind::Exact => assert_eq!(pair.score, 1.0),
                MatchKind::Fuzzy => assert!(pair.score >= 0.6),
            }
        }
    }

    #[test]
    fn test_pairs_follow_video_scan_order() {
        let result = run(&["b.mp4", "a.mp4"], &["a.m4a", "b.m4a"], 0.8);
        assert_eq!(pair_names(&result)[0].0, "b.mp4");
        assert_eq!(pair_names(&result)[1].0, "a.mp4");
    }
}
