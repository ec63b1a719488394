use super::executor::{worker_loop, WorkerContext};
use super::MergeSettings;
use crate::matcher::MatchPair;
use crate::state::{BatchEvent, BatchProgress, JobCounts, MergeJob};
use avmerge_common::{BatchId, Error, JobState, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Final state of every job once a batch has finished.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub jobs: Vec<MergeJob>,
    pub counts: JobCounts,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &MergeJob> {
        self.jobs.iter().filter(|j| j.state == JobState::Failed)
    }

    /// No job failed or was cancelled.
    pub fn is_success(&self) -> bool {
        self.counts.failed == 0 && self.counts.cancelled == 0
    }
}

/// Handle to a batch of merge jobs.
///
/// Create with [`BatchRun::new`], subscribe if needed, then [`start`] and
/// [`wait`]. Dropping an unfinished run cancels it.
///
/// [`start`]: BatchRun::start
/// [`wait`]: BatchRun::wait
pub struct BatchRun {
    progress: Arc<BatchProgress>,
    context: Arc<WorkerContext>,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
    started: bool,
}

fn validate_tool(path: &Path) -> Result<()> {
    avmerge_av::validate_executable(path).map_err(|e| {
        let err = Error::tool_not_configured(path, e.to_string());
        error!("{}", err);
        err
    })
}

impl BatchRun {
    /// Prepare jobs for `pairs`, in order. Nothing runs until [`start`].
    ///
    /// Fails with [`Error::ToolNotConfigured`] if the merge tool (or the probe
    /// tool, when set) is not an executable file, and with
    /// [`Error::InvalidInput`] for unusable settings.
    ///
    /// [`start`]: BatchRun::start
    pub fn new(pairs: Vec<MatchPair>, settings: MergeSettings) -> Result<Self> {
        settings.validate()?;
        validate_tool(&settings.tool_path)?;
        if let Some(probe) = &settings.probe_path {
            validate_tool(probe)?;
        }

        let mut outputs = HashSet::new();
        let mut jobs = Vec::with_capacity(pairs.len());
        for (index, pair) in pairs.into_iter().enumerate() {
            let output = settings.output_path_for(&pair.video);
            if !outputs.insert(output.clone()) {
                error!("Two videos would be written to {:?}", output);
                return Err(Error::invalid_input(format!(
                    "more than one video would be written to {}",
                    output.display()
                )));
            }
            jobs.push(MergeJob::new(index, pair, output));
        }

        let progress = BatchProgress::new(BatchId::new(), jobs);
        let cancel = CancellationToken::new();
        let context = Arc::new(WorkerContext::new(
            progress.clone(),
            Arc::new(settings),
            cancel.clone(),
        ));

        Ok(Self {
            progress,
            context,
            cancel,
            workers: Vec::new(),
            started: false,
        })
    }

    pub fn id(&self) -> BatchId {
        self.progress.batch_id()
    }

    /// Shared progress view, usable for polling from any task.
    pub fn progress(&self) -> Arc<BatchProgress> {
        self.progress.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.progress.subscribe()
    }

    /// Token that cancels this batch; hand it to signal handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the batch: pending jobs never start, running merges are
    /// terminated and their partial output removed.
    pub fn cancel(&self) {
        info!("Cancelling batch {}", self.id());
        self.cancel.cancel();
    }

    /// Spawn the worker pool. Must be called within a Tokio runtime.
    /// Calling it again has no effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let jobs = self.progress.len();
        let workers = self.context.settings.max_workers.min(jobs);
        info!(
            "Starting batch {}: {} jobs on {} workers",
            self.id(),
            jobs,
            workers
        );

        self.workers = (0..workers)
            .map(|worker| tokio::spawn(worker_loop(self.context.clone(), worker)))
            .collect();
    }

    /// Run to completion (starting first if needed) and report.
    ///
    /// When this returns every job is terminal: no job is left pending or
    /// running.
    pub async fn wait(mut self) -> BatchReport {
        self.start();

        for handle in std::mem::take(&mut self.workers) {
            if let Err(e) = handle.await {
                error!("Merge worker stopped unexpectedly: {}", e);
            }
        }

        // Only a worker that died mid-job can leave one running.
        for job in self.progress.snapshot() {
            if job.state == JobState::Running {
                self.progress.finish_job(
                    job.index,
                    JobState::Failed,
                    Some("worker stopped unexpectedly".to_string()),
                );
            }
        }
        self.progress.cancel_pending();

        let counts = self.progress.finish_batch();
        BatchReport {
            batch_id: self.id(),
            jobs: self.progress.snapshot(),
            counts,
        }
    }
}

impl Drop for BatchRun {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.cancel.cancel();
        }
    }
}

/// Create a batch for `pairs` and start it immediately.
///
/// Subscribers attached to the returned run see events from that point on;
/// use [`BatchRun::new`] and [`BatchRun::start`] to subscribe first.
pub fn run_batch(pairs: Vec<MatchPair>, settings: MergeSettings) -> Result<BatchRun> {
    let mut run = BatchRun::new(pairs, settings)?;
    run.start();
    Ok(run)
}
