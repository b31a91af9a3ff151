// src/dispatch/pool.rs

//! Bounded-concurrency worker pool over a shared job queue.
//!
//! A fixed set of worker tasks pulls from the queue; each worker runs one
//! job fully before taking the next. Jobs are independent: a failure is
//! recorded in its `DispatchResult` and never aborts sibling jobs. The pool
//! returns only after every worker has finished (join barrier), and each
//! completed job is notified downstream exactly once, success or failure.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::dispatch::job::{DispatchResult, JobDescriptor};
use crate::dispatch::runner::JobRunner;
use crate::ingest::Notifier;

/// Default worker count: available parallelism minus one, minimum 1.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}

/// Run all `jobs` with at most `concurrency` workers, notifying the ingest
/// service as each job completes.
pub async fn run_pool(
    jobs: Vec<JobDescriptor>,
    concurrency: usize,
    runner: Arc<dyn JobRunner>,
    notifier: Arc<Notifier>,
) -> Vec<DispatchResult> {
    let total = jobs.len();
    let workers = concurrency.max(1).min(total.max(1));
    info!(jobs = total, workers, "dispatching reduction jobs");

    let queue: Arc<Mutex<VecDeque<JobDescriptor>>> = Arc::new(Mutex::new(jobs.into()));
    let results: Arc<Mutex<Vec<DispatchResult>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));

    let mut set = JoinSet::new();
    for worker in 0..workers {
        let queue = Arc::clone(&queue);
        let results = Arc::clone(&results);
        let runner = Arc::clone(&runner);
        let notifier = Arc::clone(&notifier);

        set.spawn(async move {
            loop {
                let job = queue.lock().await.pop_front();
                let Some(job) = job else { break };

                let exit_code = match runner.run_job(&job).await {
                    Ok(code) => code,
                    Err(err) => {
                        error!(
                            worker,
                            job = %job.source_file.display(),
                            error = %err,
                            "job execution error"
                        );
                        -1
                    }
                };

                let result = DispatchResult::new(job, exit_code);
                if !result.succeeded {
                    error!(
                        job = %result.job.source_file.display(),
                        exit_code,
                        log = %result.job.log_path.display(),
                        "reduction job failed; notifying ingest anyway"
                    );
                }

                notifier.notify(&result).await;
                results.lock().await.push(result);
            }
        });
    }

    // Join barrier: wait for every worker to drain.
    while set.join_next().await.is_some() {}

    let results = Arc::try_unwrap(results)
        .map(Mutex::into_inner)
        .unwrap_or_default();

    let failed = results.iter().filter(|r| !r.succeeded).count();
    info!(total = results.len(), failed, "dispatch complete");
    results
}
