// src/supervisor/process_table.rs

//! OS seam for the supervisor: process-table snapshots, termination, and
//! detached pipeline launch.
//!
//! Production code uses [`SysinfoTable`] and [`DetachedLauncher`]; tests
//! provide fake implementations so the lifecycle controller can be exercised
//! without touching a real process table.

use std::path::Path;
use std::process::Command;

use sysinfo::{Pid, ProcessesToUpdate, Signal, System, Users};
use tracing::{debug, info, warn};

use crate::errors::Result;

/// One process as seen in a snapshot: the element type of the snapshot and
/// of the locator's match set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub owner: String,
    pub cmdline: Vec<String>,
}

/// Trait abstracting the OS process table.
///
/// `snapshot` re-derives the full state on every call: there is no persisted
/// supervisor state, truth is always the live process table.
pub trait ProcessTable {
    /// Take a fresh snapshot of all visible processes.
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>>;

    /// Name of the invoking user; only processes owned by this user are
    /// ever candidates.
    fn current_user(&self) -> &str;

    /// Send a graceful terminate signal to `pid`. Does not wait for the
    /// process to exit. A pid that no longer exists is a successful no-op.
    fn terminate(&mut self, pid: u32) -> Result<()>;
}

/// Trait abstracting how the pipeline command is launched.
pub trait Launcher {
    /// Launch `argv` as a detached subprocess rooted at `workdir`.
    ///
    /// Fire-and-forget: no handle is retained and the supervisor never
    /// observes this process's exit. A later `status`/`stop` re-discovers
    /// it through the locator.
    fn launch(&mut self, argv: &[String], workdir: &Path) -> Result<()>;
}

/// Production process table backed by `sysinfo`.
pub struct SysinfoTable {
    system: System,
    users: Users,
    current_user: String,
}

impl SysinfoTable {
    pub fn new() -> Self {
        let system = System::new_all();
        let users = Users::new_with_refreshed_list();

        let current_user = sysinfo::get_current_pid()
            .ok()
            .and_then(|pid| system.process(pid))
            .and_then(|proc| proc.user_id())
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|user| user.name().to_string())
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_default();

        Self {
            system,
            users,
            current_user,
        }
    }
}

impl Default for SysinfoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoTable {
    fn snapshot(&mut self) -> Result<Vec<ProcessRecord>> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let records = self
            .system
            .processes()
            .iter()
            .map(|(pid, proc)| {
                let owner = proc
                    .user_id()
                    .and_then(|uid| self.users.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
                    .unwrap_or_default();

                ProcessRecord {
                    pid: pid.as_u32(),
                    owner,
                    cmdline: proc
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect(),
                }
            })
            .collect();

        Ok(records)
    }

    fn current_user(&self) -> &str {
        &self.current_user
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let Some(proc) = self.system.process(pid) else {
            debug!(pid = pid.as_u32(), "process already gone; nothing to terminate");
            return Ok(());
        };

        info!(pid = pid.as_u32(), "terminating process");
        match proc.kill_with(Signal::Term) {
            Some(true) => {}
            // Term unsupported or refused; fall back to the default signal.
            _ => {
                if !proc.kill() {
                    warn!(pid = pid.as_u32(), "failed to signal process");
                }
            }
        }

        Ok(())
    }
}

/// Production launcher: spawns the pipeline and drops the handle.
pub struct DetachedLauncher;

impl Launcher for DetachedLauncher {
    fn launch(&mut self, argv: &[String], workdir: &Path) -> Result<()> {
        let Some((head, rest)) = argv.split_first() else {
            return Err(crate::errors::DrpError::ConfigError(
                "pipeline command resolved to an empty argument vector".to_string(),
            ));
        };

        info!(cmd = ?argv, workdir = %workdir.display(), "launching pipeline");

        let child = Command::new(head)
            .args(rest)
            .current_dir(workdir)
            .spawn()?;

        // Dropping the Child detaches it; the supervisor never waits.
        debug!(pid = child.id(), "pipeline launched");
        Ok(())
    }
}
