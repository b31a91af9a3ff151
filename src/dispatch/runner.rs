// src/dispatch/runner.rs

//! Individual job subprocess runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::info;

use crate::dispatch::job::JobDescriptor;

/// Trait abstracting how one job's subprocess is run.
///
/// Production code uses [`SubprocessRunner`]; tests can provide an
/// implementation that records jobs and returns canned exit codes without
/// spawning real processes.
pub trait JobRunner: Send + Sync {
    /// Run the job to completion and return its exit code.
    fn run_job<'a>(
        &'a self,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + 'a>>;
}

/// Real runner: spawns the job command with both output streams redirected
/// to the job's dedicated log file, and waits for exit.
pub struct SubprocessRunner;

impl JobRunner for SubprocessRunner {
    fn run_job<'a>(
        &'a self,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let (head, rest) = job
                .command
                .split_first()
                .context("job has an empty command")?;

            if let Some(parent) = job.log_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let log = std::fs::File::create(&job.log_path)
                .with_context(|| format!("creating log file {}", job.log_path.display()))?;
            let log_err = log.try_clone()?;

            info!(
                job = %job.source_file.display(),
                log = %job.log_path.display(),
                "starting reduction job"
            );

            let status = Command::new(head)
                .args(rest)
                .stdout(Stdio::from(log))
                .stderr(Stdio::from(log_err))
                .status()
                .await
                .with_context(|| format!("spawning job for {}", job.source_file.display()))?;

            Ok(status.code().unwrap_or(-1))
        })
    }
}
