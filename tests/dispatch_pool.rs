// tests/dispatch_pool.rs

//! Dispatch pool tests with a fake job runner, plus a couple of real
//! subprocess-runner tests using `sh`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use drpctl::config::IngestSection;
use drpctl::dispatch::{run_pool, JobDescriptor, SubprocessRunner};
use drpctl::ingest::Notifier;
use drpctl_test_utils::fakes::{FakeJobRunner, RecordingTransport};
use drpctl_test_utils::{init_tracing, with_timeout};

fn make_job(out: &Path, name: &str) -> JobDescriptor {
    JobDescriptor {
        source_file: out.join(format!("setups/{name}.setup")),
        working_output: out.join(format!("redux/{name}")),
        command: vec!["run_pipeline".to_string(), name.to_string()],
        log_path: out.join(format!("redux/{name}.log")),
    }
}

fn notifier(transport: RecordingTransport) -> Arc<Notifier> {
    Arc::new(Notifier::new(
        "KCWI",
        IngestSection::default(),
        Box::new(transport),
    ))
}

#[tokio::test]
async fn five_jobs_concurrency_two_all_complete() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<_> = (0..5)
        .map(|i| make_job(tmp.path(), &format!("kcwi_{i}")))
        .collect();

    let runner = Arc::new(FakeJobRunner::new().with_delay(Duration::from_millis(20)));
    let max_in_flight = Arc::clone(&runner.max_in_flight);
    let transport = RecordingTransport::new();
    let events = Arc::clone(&transport.events);

    let results = with_timeout(run_pool(jobs, 2, runner, notifier(transport))).await;

    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.succeeded));

    // The concurrency bound held at every instant.
    let max = max_in_flight.load(std::sync::atomic::Ordering::SeqCst);
    assert!(max <= 2, "observed {max} jobs in flight");

    // One notification per job, no more, no less.
    assert_eq!(events.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn one_failing_job_does_not_abort_siblings() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<_> = (0..5)
        .map(|i| make_job(tmp.path(), &format!("kcwi_{i}")))
        .collect();

    let runner = Arc::new(FakeJobRunner::new().with_exit_code("kcwi_2.setup", 3));
    let transport = RecordingTransport::new();
    let events = Arc::clone(&transport.events);

    let results = with_timeout(run_pool(jobs, 2, runner, notifier(transport))).await;

    assert_eq!(results.len(), 5);
    assert_eq!(results.iter().filter(|r| !r.succeeded).count(), 1);

    let failed = results.iter().find(|r| !r.succeeded).unwrap();
    assert_eq!(failed.exit_code, 3);
    assert!(failed.job.source_file.ends_with("kcwi_2.setup"));

    // Failed jobs are notified too.
    assert_eq!(events.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn every_job_is_consumed_exactly_once() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<_> = (0..8)
        .map(|i| make_job(tmp.path(), &format!("kcwi_{i}")))
        .collect();

    let runner = Arc::new(FakeJobRunner::new());
    let executed = Arc::clone(&runner.executed);
    let transport = RecordingTransport::new();

    let results = with_timeout(run_pool(jobs, 3, runner, notifier(transport))).await;

    let executed = executed.lock().unwrap();
    let distinct: HashSet<_> = executed.iter().collect();
    assert_eq!(executed.len(), 8, "no job lost");
    assert_eq!(distinct.len(), 8, "no job duplicated");
    assert_eq!(results.len(), 8);
}

#[tokio::test]
async fn concurrency_larger_than_job_count_is_fine() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<_> = (0..3)
        .map(|i| make_job(tmp.path(), &format!("kcwi_{i}")))
        .collect();

    let results = with_timeout(run_pool(
        jobs,
        16,
        Arc::new(FakeJobRunner::new()),
        notifier(RecordingTransport::new()),
    ))
    .await;
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn failing_notifications_do_not_fail_the_batch() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<_> = (0..4)
        .map(|i| make_job(tmp.path(), &format!("kcwi_{i}")))
        .collect();

    let transport = RecordingTransport::failing();
    let events = Arc::clone(&transport.events);

    let results = with_timeout(run_pool(
        jobs,
        2,
        Arc::new(FakeJobRunner::new()),
        notifier(transport),
    ))
    .await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.succeeded));
    assert_eq!(events.lock().unwrap().len(), 4);
}

#[cfg(unix)]
#[tokio::test]
async fn subprocess_runner_writes_one_log_per_job() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let jobs: Vec<JobDescriptor> = (0..3)
        .map(|i| {
            let mut job = make_job(tmp.path(), &format!("kcwi_{i}"));
            job.command = vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("echo out {i}; echo err {i} 1>&2"),
            ];
            job
        })
        .collect();
    let log_paths: Vec<_> = jobs.iter().map(|j| j.log_path.clone()).collect();

    let results = with_timeout(run_pool(
        jobs,
        2,
        Arc::new(SubprocessRunner),
        notifier(RecordingTransport::new()),
    ))
    .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.succeeded));

    for (i, log) in log_paths.iter().enumerate() {
        let contents = std::fs::read_to_string(log).unwrap();
        assert!(contents.contains(&format!("out {i}")));
        assert!(contents.contains(&format!("err {i}")));
    }
}

#[cfg(unix)]
#[tokio::test]
async fn subprocess_runner_reports_nonzero_exit() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();

    let mut job = make_job(tmp.path(), "kcwi_bad");
    job.command = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];

    let results = with_timeout(run_pool(
        vec![job],
        1,
        Arc::new(SubprocessRunner),
        notifier(RecordingTransport::new()),
    ))
    .await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].succeeded);
    assert_eq!(results[0].exit_code, 3);
}
