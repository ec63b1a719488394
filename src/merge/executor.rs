//! Execution of a single merge job.
//!
//! A worker takes a job index from the shared queue and drives it to a
//! terminal state: skip check, duration probe, tool run with streamed
//! progress, then moving the staged output into place.

use super::MergeSettings;
use crate::state::{BatchProgress, MergeJob};
use avmerge_av::{parse_progress_line, probe_duration, MergeCommand, ProgressUpdate, StagedOutput};
use avmerge_common::{Error, JobState};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared by all workers of one batch.
pub(crate) struct WorkerContext {
    pub progress: Arc<BatchProgress>,
    pub settings: Arc<MergeSettings>,
    pub cancel: CancellationToken,
    pub queue: Mutex<VecDeque<usize>>,
    /// Set once the tool disappears mid-batch; later jobs fail without
    /// trying to spawn it.
    tool_lost: AtomicBool,
}

impl WorkerContext {
    pub fn new(
        progress: Arc<BatchProgress>,
        settings: Arc<MergeSettings>,
        cancel: CancellationToken,
    ) -> Self {
        let queue = (0..progress.len()).collect();
        Self {
            progress,
            settings,
            cancel,
            queue: Mutex::new(queue),
            tool_lost: AtomicBool::new(false),
        }
    }

    fn next_job(&self) -> Option<usize> {
        self.queue.lock().pop_front()
    }

    /// Record that `tool` can no longer be run. Only the first report is
    /// logged.
    fn lose_tool(&self, tool: &Path, reason: impl std::fmt::Display) -> Error {
        if !self.tool_lost.swap(true, Ordering::AcqRel) {
            error!(
                "{:?} is no longer usable ({}); remaining jobs will fail",
                tool, reason
            );
        }
        Error::tool_not_configured(tool, reason.to_string())
    }
}

enum JobOutcome {
    Succeeded,
    Skipped,
    Cancelled,
    Failed(Error),
}

enum ToolRun {
    Exited(ExitStatus, String),
    Cancelled,
    Stalled(Duration),
    SpawnFailed(std::io::Error),
    Io(std::io::Error),
}

/// Pull jobs until the queue is empty or the batch is cancelled.
pub(crate) async fn worker_loop(ctx: Arc<WorkerContext>, worker: usize) {
    debug!("Worker {} started", worker);
    while !ctx.cancel.is_cancelled() {
        let Some(index) = ctx.next_job() else {
            break;
        };
        run_job(&ctx, index).await;
    }
    debug!("Worker {} finished", worker);
}

async fn run_job(ctx: &WorkerContext, index: usize) {
    let Some(job) = ctx.progress.job(index) else {
        return;
    };

    let (state, error) = match execute_job(ctx, &job).await {
        JobOutcome::Succeeded => (JobState::Succeeded, None),
        JobOutcome::Skipped => (JobState::Skipped, None),
        JobOutcome::Cancelled => (JobState::Cancelled, None),
        JobOutcome::Failed(err) => (JobState::Failed, Some(err.to_string())),
    };
    ctx.progress.finish_job(index, state, error);
}

async fn execute_job(ctx: &WorkerContext, job: &MergeJob) -> JobOutcome {
    let settings = &ctx.settings;

    if ctx.tool_lost.load(Ordering::Acquire) {
        return JobOutcome::Failed(Error::tool_not_configured(
            &settings.tool_path,
            "tool became unavailable during the batch",
        ));
    }

    if !settings.overwrite && job.output.exists() {
        info!("Skipping {}: {:?} already exists", job.name(), job.output);
        return JobOutcome::Skipped;
    }

    if let Some(dir) = job.output.parent() {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            return JobOutcome::Failed(e.into());
        }
    }

    ctx.progress.start_job(job.index);

    let video = &job.pair.video.path;
    let probed = tokio::select! {
        _ = ctx.cancel.cancelled() => return JobOutcome::Cancelled,
        probed = probe_duration(
            &settings.tool_path,
            settings.probe_path.as_deref(),
            video,
            settings.probe_timeout,
        ) => probed,
    };
    let total = match probed {
        Ok(total) => total,
        Err(e) if e.is_missing_tool() => {
            let tool = settings
                .probe_path
                .as_deref()
                .unwrap_or(settings.tool_path.as_path());
            return JobOutcome::Failed(ctx.lose_tool(tool, e));
        }
        Err(e) => return JobOutcome::Failed(Error::duration_probe(video, e.to_string())),
    };
    debug!("{} lasts {:?}", job.name(), total);
    ctx.progress.set_total(job.index, total);

    let staged = match StagedOutput::new(&job.output) {
        Ok(staged) => staged,
        Err(e) => return JobOutcome::Failed(Error::Io(std::io::Error::other(e))),
    };

    let mut merge = MergeCommand::new(
        video.clone(),
        job.pair.audio.path.clone(),
        staged.path().to_path_buf(),
    );
    merge.video_codec = settings.video_codec.clone();
    merge.audio_codec = settings.audio_codec.clone();
    merge.shortest = settings.shortest;

    // Dropping `staged` on any path but success removes the partial file.
    match run_tool(ctx, job.index, &merge.to_args()).await {
        ToolRun::Exited(status, _) if status.success() => {
            match staged.finalize(settings.overwrite) {
                Ok(path) => {
                    debug!("Wrote {:?}", path);
                    JobOutcome::Succeeded
                }
                Err(avmerge_av::Error::Io(e)) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    info!("{:?} appeared while merging; leaving it in place", job.output);
                    JobOutcome::Skipped
                }
                Err(e) => JobOutcome::Failed(Error::Io(std::io::Error::other(e))),
            }
        }
        ToolRun::Exited(status, diagnostics) => {
            JobOutcome::Failed(Error::subprocess(status.code(), diagnostics))
        }
        ToolRun::Cancelled => JobOutcome::Cancelled,
        ToolRun::Stalled(after) => JobOutcome::Failed(Error::Stalled {
            seconds: after.as_secs(),
        }),
        ToolRun::SpawnFailed(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            JobOutcome::Failed(ctx.lose_tool(&settings.tool_path, e))
        }
        ToolRun::SpawnFailed(e) | ToolRun::Io(e) => JobOutcome::Failed(Error::Io(e)),
    }
}

async fn stall_timer(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Run the merge tool, feeding every output line to the progress parser.
async fn run_tool(ctx: &WorkerContext, index: usize, args: &[OsString]) -> ToolRun {
    let settings = &ctx.settings;
    debug!("Running {:?} with args: {:?}", settings.tool_path, args);

    let mut child = match Command::new(&settings.tool_path)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return ToolRun::SpawnFailed(e),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return ToolRun::Io(std::io::Error::other("child output pipes unavailable"));
    };
    let mut stdout = BufReader::new(stdout).lines();
    let mut stderr = BufReader::new(stderr).lines();
    let mut tail = DiagnosticTail::new(settings.diagnostic_lines);
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                terminate(&mut child, settings.cancel_grace).await;
                return ToolRun::Cancelled;
            }
            _ = stall_timer(settings.stall_timeout) => {
                let after = settings.stall_timeout.unwrap_or_default();
                warn!("Job {} produced no output for {:?}; stopping it", index, after);
                terminate(&mut child, Duration::ZERO).await;
                return ToolRun::Stalled(after);
            }
            line = stdout.next_line(), if stdout_open => match line {
                Ok(Some(line)) => apply_progress(&ctx.progress, index, &line),
                Ok(None) => stdout_open = false,
                Err(e) => {
                    debug!("Job {} stdout closed: {}", index, e);
                    stdout_open = false;
                }
            },
            line = stderr.next_line(), if stderr_open => match line {
                Ok(Some(line)) => {
                    apply_progress(&ctx.progress, index, &line);
                    tail.push(line);
                }
                Ok(None) => stderr_open = false,
                Err(e) => {
                    debug!("Job {} stderr closed: {}", index, e);
                    stderr_open = false;
                }
            },
        }
    }

    // Both pipes closed, but the tool may still hang without them
    tokio::select! {
        _ = ctx.cancel.cancelled() => {
            terminate(&mut child, settings.cancel_grace).await;
            ToolRun::Cancelled
        }
        _ = stall_timer(settings.stall_timeout) => {
            let after = settings.stall_timeout.unwrap_or_default();
            warn!("Job {} closed its output but did not exit in {:?}; stopping it", index, after);
            terminate(&mut child, Duration::ZERO).await;
            ToolRun::Stalled(after)
        }
        status = child.wait() => match status {
            Ok(status) => ToolRun::Exited(status, tail.joined()),
            Err(e) => ToolRun::Io(e),
        },
    }
}

fn apply_progress(progress: &BatchProgress, index: usize, line: &str) {
    match parse_progress_line(line) {
        Some(ProgressUpdate::Time(elapsed)) => progress.update_elapsed(index, elapsed),
        Some(ProgressUpdate::End) => progress.mark_end(index),
        None => {}
    }
}

/// Ask the process to stop, then kill it if it outlives `grace`.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let (Some(pid), false) = (child.id(), grace.is_zero()) {
            match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => match tokio::time::timeout(grace, child.wait()).await {
                    Ok(_) => return,
                    Err(_) => warn!("Process {} ignored SIGTERM for {:?}; killing", pid, grace),
                },
                Err(e) => debug!("SIGTERM to {} failed: {}", pid, e),
            }
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        debug!("Kill failed: {}", e);
    }
}

/// The last few stderr lines, kept for failure reports.
struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if self.capacity == 0 || line.trim().is_empty() {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn joined(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
