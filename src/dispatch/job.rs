// src/dispatch/job.rs

//! Job data types shared by discovery, the pool, and the ingest notifier.

use std::path::PathBuf;

/// One independently reducible unit of work, created by discovery and
/// consumed exactly once by the dispatch pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// The job description file produced by the setup step.
    pub source_file: PathBuf,

    /// Output directory owned by this job alone.
    pub working_output: PathBuf,

    /// Full argument vector for the reduction subprocess.
    pub command: Vec<String>,

    /// Log file receiving both output streams of the subprocess.
    pub log_path: PathBuf,
}

/// Outcome of one job, produced by a worker and consumed by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub job: JobDescriptor,
    pub exit_code: i32,
    pub succeeded: bool,
}

impl DispatchResult {
    pub fn new(job: JobDescriptor, exit_code: i32) -> Self {
        Self {
            succeeded: exit_code == 0,
            exit_code,
            job,
        }
    }
}
