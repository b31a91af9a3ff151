#![allow(dead_code)]

//! Fake collaborators for exercising the supervisor and the dispatch pool
//! without a real process table, scheduling service, or subprocesses.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drpctl::dispatch::{JobDescriptor, JobRunner};
use drpctl::errors::Result;
use drpctl::ingest::{IngestEvent, IngestTransport};
use drpctl::supervisor::{Launcher, ProcessRecord, ProcessTable, ScheduleService};

/// In-memory process table shared between a [`FakeProcessTable`] and a
/// [`FakeLauncher`], so a launch becomes visible to the next snapshot.
pub type SharedProcesses = Arc<Mutex<Vec<ProcessRecord>>>;

pub fn shared_processes(initial: Vec<ProcessRecord>) -> SharedProcesses {
    Arc::new(Mutex::new(initial))
}

pub fn record(pid: u32, owner: &str, cmdline: &[&str]) -> ProcessRecord {
    ProcessRecord {
        pid,
        owner: owner.to_string(),
        cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
    }
}

/// Fake process table over a shared in-memory process list.
///
/// `terminate` records the pid and removes the process, so a subsequent
/// snapshot observes it as gone.
pub struct FakeProcessTable {
    user: String,
    processes: SharedProcesses,
    pub terminated: Arc<Mutex<Vec<u32>>>,
}

impl FakeProcessTable {
    pub fn new(user: &str, processes: SharedProcesses) -> Self {
        Self {
            user: user.to_string(),
            processes,
            terminated: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ProcessTable for FakeProcessTable {
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>> {
        Ok(self.processes.lock().unwrap().clone())
    }

    fn current_user(&self) -> &str {
        &self.user
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        self.terminated.lock().unwrap().push(pid);
        self.processes.lock().unwrap().retain(|p| p.pid != pid);
        Ok(())
    }
}

/// Fake launcher that records launches and (optionally) inserts a process
/// record into the shared table so the post-launch re-scan finds it.
pub struct FakeLauncher {
    processes: SharedProcesses,
    spawned: Option<ProcessRecord>,
    pub launches: Arc<Mutex<Vec<(Vec<String>, PathBuf)>>>,
}

impl FakeLauncher {
    pub fn new(processes: SharedProcesses, spawned: Option<ProcessRecord>) -> Self {
        Self {
            processes,
            spawned,
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, argv: &[String], workdir: &Path) -> Result<()> {
        self.launches
            .lock()
            .unwrap()
            .push((argv.to_vec(), workdir.to_path_buf()));
        if let Some(proc) = &self.spawned {
            self.processes.lock().unwrap().push(proc.clone());
        }
        Ok(())
    }
}

/// Fake scheduling service returning a canned body (or a transport error),
/// recording every requested date.
pub struct FakeSchedule {
    response: std::result::Result<String, String>,
    pub requested_dates: Arc<Mutex<Vec<String>>>,
}

impl FakeSchedule {
    pub fn with_body(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            requested_dates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requested_dates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An "Available: 1" response for one instrument.
    pub fn available(instrument: &str) -> Self {
        Self::with_body(&format!(r#"[{{"{instrument}": {{"Available": 1}}}}]"#))
    }

    /// An "Available: 0" response for one instrument.
    pub fn unavailable(instrument: &str) -> Self {
        Self::with_body(&format!(r#"[{{"{instrument}": {{"Available": 0}}}}]"#))
    }
}

impl ScheduleService for FakeSchedule {
    fn instrument_status(
        &self,
        date: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + '_>> {
        self.requested_dates.lock().unwrap().push(date.to_string());
        let response = self.response.clone();
        Box::pin(async move { response.map_err(|msg| anyhow::anyhow!(msg)) })
    }
}

/// Fake job runner with per-job canned exit codes and in-flight tracking.
///
/// `max_in_flight` records the highest number of concurrently running jobs
/// observed, for asserting the pool's concurrency bound.
pub struct FakeJobRunner {
    exit_codes: HashMap<String, i32>,
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: Arc<AtomicUsize>,
    pub executed: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeJobRunner {
    pub fn new() -> Self {
        Self {
            exit_codes: HashMap::new(),
            delay: Duration::from_millis(10),
            in_flight: AtomicUsize::new(0),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the job whose source file name matches `file_name` exit with
    /// `code`. Unlisted jobs exit 0.
    pub fn with_exit_code(mut self, file_name: &str, code: i32) -> Self {
        self.exit_codes.insert(file_name.to_string(), code);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Default for FakeJobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner for FakeJobRunner {
    fn run_job<'a>(
        &'a self,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;

            self.executed.lock().unwrap().push(job.source_file.clone());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let name = job
                .source_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(self.exit_codes.get(&name).copied().unwrap_or(0))
        })
    }
}

/// Fake ingest transport recording every event; optionally failing.
pub struct RecordingTransport {
    pub events: Arc<Mutex<Vec<IngestEvent>>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestTransport for RecordingTransport {
    fn send<'a>(
        &'a self,
        event: &'a IngestEvent,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        let events = Arc::clone(&self.events);
        let event = event.clone();
        let fail = self.fail;
        Box::pin(async move {
            events.lock().unwrap().push(event);
            if fail {
                anyhow::bail!("ingest transport down");
            }
            Ok(())
        })
    }
}
