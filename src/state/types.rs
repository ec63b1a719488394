use crate::matcher::MatchPair;
use avmerge_common::{JobId, JobState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One video + audio merge inside a batch.
///
/// Transition methods return `false` and change nothing once the job is in a
/// terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct MergeJob {
    pub id: JobId,
    /// Position in submission order.
    pub index: usize,
    pub pair: MatchPair,
    pub output: PathBuf,
    pub state: JobState,
    /// Fraction complete, `0.0..=1.0`.
    pub progress: f64,
    /// Media time processed so far.
    pub elapsed: Option<Duration>,
    /// Probed duration of the video.
    pub total: Option<Duration>,
    /// Diagnostic detail when the job failed.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MergeJob {
    pub fn new(index: usize, pair: MatchPair, output: PathBuf) -> Self {
        Self {
            id: JobId::new(),
            index,
            pair,
            output,
            state: JobState::Pending,
            progress: 0.0,
            elapsed: None,
            total: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Display name: the video's file name.
    pub fn name(&self) -> String {
        self.pair.video.file_name()
    }

    pub fn start(&mut self) -> bool {
        if self.state != JobState::Pending {
            return false;
        }
        self.state = JobState::Running;
        self.started_at = Some(Utc::now());
        true
    }

    pub fn set_total(&mut self, total: Duration) {
        if self.state == JobState::Running {
            self.total = Some(total);
        }
    }

    /// Record processed media time. Returns whether the progress changed.
    pub fn update_elapsed(&mut self, elapsed: Duration) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.elapsed = Some(elapsed);
        let progress = match self.total {
            Some(total) => avmerge_av::progress::fraction(elapsed, total),
            None => self.progress,
        };
        self.set_progress(progress)
    }

    /// The tool reported the end of its output.
    pub fn mark_end(&mut self) -> bool {
        if self.state != JobState::Running {
            return false;
        }
        self.set_progress(1.0)
    }

    fn set_progress(&mut self, progress: f64) -> bool {
        let progress = progress.clamp(0.0, 1.0);
        if progress == self.progress {
            return false;
        }
        self.progress = progress;
        true
    }

    /// Move to a terminal state.
    pub fn finish(&mut self, state: JobState, error: Option<String>) -> bool {
        if self.state.is_terminal() || !state.is_terminal() {
            return false;
        }
        self.state = state;
        if state == JobState::Succeeded {
            self.progress = 1.0;
        }
        self.error = error;
        self.finished_at = Some(Utc::now());
        true
    }

    /// Share of the batch this job accounts for, `0.0..=1.0`.
    pub fn contribution(&self) -> f64 {
        match self.state {
            JobState::Pending => 0.0,
            JobState::Running => self.progress,
            _ => 1.0,
        }
    }
}

/// Media time as `H:MM:SS`, fractions truncated.
pub fn format_clock(time: Duration) -> String {
    let secs = time.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// One-line progress of a running job, e.g. `42.0% (0:01:03/0:02:30)`.
///
/// The times are left out until both are known.
pub fn progress_text(progress: f64, elapsed: Option<Duration>, total: Option<Duration>) -> String {
    let percent = format!("{:.1}%", progress * 100.0);
    match (elapsed, total) {
        (Some(elapsed), Some(total)) => {
            format!("{} ({}/{})", percent, format_clock(elapsed), format_clock(total))
        }
        _ => percent,
    }
}

/// Number of jobs in each state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
}

impl JobCounts {
    pub fn from_jobs(jobs: &[MergeJob]) -> Self {
        let mut counts = Self {
            total: jobs.len(),
            ..Default::default()
        };
        for job in jobs {
            match job.state {
                JobState::Pending => counts.pending += 1,
                JobState::Running => counts.running += 1,
                JobState::Succeeded => counts.succeeded += 1,
                JobState::Failed => counts.failed += 1,
                JobState::Skipped => counts.skipped += 1,
                JobState::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// Jobs in any terminal state.
    pub fn finished(&self) -> usize {
        self.succeeded + self.failed + self.skipped + self.cancelled
    }
}

impl fmt::Display for JobCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped, {} cancelled",
            self.succeeded, self.failed, self.skipped, self.cancelled
        )?;
        if self.pending + self.running > 0 {
            write!(f, ", {} pending, {} running", self.pending, self.running)?;
        }
        Ok(())
    }
}
