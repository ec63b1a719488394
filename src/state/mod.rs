//! Progress aggregation for a batch of merge jobs.
//!
//! [`BatchProgress`] is the single owner of job state while a batch runs.
//! Workers report through it, readers either poll [`BatchProgress::snapshot`]
//! or subscribe to [`BatchEvent`]s. Sending events never blocks; a slow
//! subscriber only misses events.

mod types;

pub use types::*;

use avmerge_common::{BatchId, JobId, JobState};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Change notifications emitted while a batch runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    JobStarted {
        batch_id: BatchId,
        job_id: JobId,
        index: usize,
    },
    JobProgress {
        index: usize,
        progress: f64,
        /// Media time processed so far, once the tool reported any.
        elapsed: Option<Duration>,
        /// Probed duration of the video.
        total: Option<Duration>,
        overall: f64,
    },
    /// Sent once per job; `overall` already includes this job.
    JobFinished {
        job_id: JobId,
        index: usize,
        state: JobState,
        error: Option<String>,
        overall: f64,
    },
    /// Sent once, after every job is terminal.
    BatchFinished {
        batch_id: BatchId,
        counts: JobCounts,
    },
}

/// Aggregate progress over all jobs: terminal jobs count fully, running
/// jobs by their own fraction, pending jobs not at all.
fn overall(jobs: &[MergeJob]) -> f64 {
    if jobs.is_empty() {
        return 1.0;
    }
    jobs.iter().map(MergeJob::contribution).sum::<f64>() / jobs.len() as f64
}

pub struct BatchProgress {
    batch_id: BatchId,
    jobs: RwLock<Vec<MergeJob>>,
    event_tx: broadcast::Sender<BatchEvent>,
}

impl BatchProgress {
    pub fn new(batch_id: BatchId, jobs: Vec<MergeJob>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            batch_id,
            jobs: RwLock::new(jobs),
            event_tx,
        })
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.event_tx.subscribe()
    }

    fn broadcast(&self, event: BatchEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("No subscribers for batch event");
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Copy of every job, in submission order.
    pub fn snapshot(&self) -> Vec<MergeJob> {
        self.jobs.read().clone()
    }

    pub fn job(&self, index: usize) -> Option<MergeJob> {
        self.jobs.read().get(index).cloned()
    }

    pub fn counts(&self) -> JobCounts {
        JobCounts::from_jobs(&self.jobs.read())
    }

    /// Overall progress in `0.0..=1.0`, counting partial progress of running
    /// jobs. An empty batch is complete.
    pub fn overall_progress(&self) -> f64 {
        overall(&self.jobs.read())
    }

    /// Fraction of jobs that are terminal, ignoring in-flight progress.
    pub fn completed_fraction(&self) -> f64 {
        let counts = self.counts();
        if counts.total == 0 {
            return 1.0;
        }
        counts.finished() as f64 / counts.total as f64
    }

    /// Pending -> Running. Returns false if the job was not pending.
    pub fn start_job(&self, index: usize) -> bool {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.get_mut(index) else {
            return false;
        };
        if !job.start() {
            return false;
        }
        tracing::info!("Job {} started: {}", index, job.name());
        self.broadcast(BatchEvent::JobStarted {
            batch_id: self.batch_id,
            job_id: job.id,
            index,
        });
        true
    }

    pub fn set_total(&self, index: usize, total: Duration) {
        if let Some(job) = self.jobs.write().get_mut(index) {
            job.set_total(total);
        }
    }

    /// Record processed media time for a running job.
    pub fn update_elapsed(&self, index: usize, elapsed: Duration) {
        self.update_with(index, |job| job.update_elapsed(elapsed));
    }

    /// The tool signalled it finished writing; progress jumps to 1.0.
    pub fn mark_end(&self, index: usize) {
        self.update_with(index, MergeJob::mark_end);
    }

    fn update_with(&self, index: usize, apply: impl FnOnce(&mut MergeJob) -> bool) {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.get_mut(index) else {
            return;
        };
        if !apply(job) {
            return;
        }
        let (progress, elapsed, total) = (job.progress, job.elapsed, job.total);
        let overall = overall(&jobs);
        tracing::trace!("Job {} at {:.1}%", index, progress * 100.0);
        self.broadcast(BatchEvent::JobProgress {
            index,
            progress,
            elapsed,
            total,
            overall,
        });
    }

    /// Move a job to a terminal state. Returns false if it already was
    /// terminal; the first terminal state wins.
    pub fn finish_job(&self, index: usize, state: JobState, error: Option<String>) -> bool {
        let mut jobs = self.jobs.write();
        let Some(job) = jobs.get_mut(index) else {
            return false;
        };
        if !job.finish(state, error.clone()) {
            return false;
        }
        let job_id = job.id;
        match (&state, &error) {
            (JobState::Failed, Some(err)) => {
                tracing::warn!("Job {} failed: {}: {}", index, job.name(), err)
            }
            _ => tracing::info!("Job {} {}: {}", index, state, job.name()),
        }

        let overall = overall(&jobs);
        self.broadcast(BatchEvent::JobFinished {
            job_id,
            index,
            state,
            error,
            overall,
        });
        true
    }

    /// Cancel every job that never started. Returns how many were cancelled.
    pub fn cancel_pending(&self) -> usize {
        let pending: Vec<usize> = self
            .jobs
            .read()
            .iter()
            .filter(|j| j.state == JobState::Pending)
            .map(|j| j.index)
            .collect();

        pending
            .into_iter()
            .filter(|&index| self.finish_job(index, JobState::Cancelled, None))
            .count()
    }

    /// Announce the end of the batch.
    pub fn finish_batch(&self) -> JobCounts {
        let counts = self.counts();
        tracing::info!("Batch {} finished: {}", self.batch_id, counts);
        self.broadcast(BatchEvent::BatchFinished {
            batch_id: self.batch_id,
            counts,
        });
        counts
    }
}
