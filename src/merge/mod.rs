//! Merge job runner.
//!
//! Turns match pairs into merge jobs and runs them on a fixed-size worker
//! pool. Jobs start in submission order; a worker picks up the next job only
//! after its current one reaches a terminal state. Per-job failures are
//! recorded on the job and never stop the batch.

mod batch;
mod executor;
mod settings;

pub use batch::{run_batch, BatchReport, BatchRun};
pub use settings::{
    MergeSettings, OutputPlacement, DEFAULT_DIAGNOSTIC_LINES, DEFAULT_MAX_WORKERS, DEFAULT_SUFFIX,
};
