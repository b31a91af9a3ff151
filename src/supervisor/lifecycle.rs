// src/supervisor/lifecycle.rs

//! Lifecycle controller: translates start/stop/restart/status into process
//! actions using signature matching and directory/command resolution.
//!
//! State is never persisted. `Running` vs `Stopped` is re-derived from a
//! fresh process-table snapshot on every operation, which makes the
//! supervisor stateless and crash-safe. Two overlapping invocations can
//! still race between scan and act (both observing "not running" and both
//! launching); that narrow window is a known, accepted limitation.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::cli::LifecycleAction;
use crate::config::model::{Config, InstrumentConfig};
use crate::config::validate::verify_account;
use crate::errors::{DrpError, Result};
use crate::supervisor::availability::{check_available, ScheduleService};
use crate::supervisor::locator::find;
use crate::supervisor::process_table::{Launcher, ProcessRecord, ProcessTable};
use crate::supervisor::signature::ProcessSignature;

/// Source/output directories and the resolved pipeline argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPipeline {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub argv: Vec<String>,
}

/// Result of one lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The matched process set after the operation (may be empty).
    Processes(Vec<ProcessRecord>),

    /// `start` was gated off by the availability check. A caller-visible
    /// "did not start" outcome, distinct from failure.
    NotAvailable,
}

impl LifecycleOutcome {
    /// Map the outcome to a process exit code for the given action.
    ///
    /// start/restart/status succeed when at least one matching process
    /// exists; stop succeeds when none remain. An availability-gated start
    /// did what was asked of it, so it exits 0.
    pub fn exit_code(&self, action: LifecycleAction) -> i32 {
        match self {
            LifecycleOutcome::NotAvailable => 0,
            LifecycleOutcome::Processes(matches) => {
                let running = !matches.is_empty();
                let ok = match action {
                    LifecycleAction::Stop => !running,
                    _ => running,
                };
                i32::from(!ok)
            }
        }
    }
}

/// Orchestrates lifecycle operations for one instrument/date.
pub struct LifecycleController<'a, T: ProcessTable, L: Launcher> {
    instrument: String,
    inst: &'a InstrumentConfig,
    archive_root: PathBuf,
    utdate: String,
    level: u8,
    skip_availability: bool,
    table: T,
    launcher: L,
    schedule: &'a dyn ScheduleService,
}

impl<'a, T: ProcessTable, L: Launcher> LifecycleController<'a, T, L> {
    /// Build a controller for one invocation.
    ///
    /// Fails fast on configuration errors: unknown instrument or an
    /// ownership mismatch between the configured account and the invoking
    /// user.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a Config,
        instrument: &str,
        utdate: String,
        level: u8,
        skip_availability: bool,
        table: T,
        launcher: L,
        schedule: &'a dyn ScheduleService,
    ) -> Result<Self> {
        let instrument = instrument.to_uppercase();
        let inst = config.instrument(&instrument)?;
        verify_account(&instrument, &inst.account, table.current_user())?;

        Ok(Self {
            instrument,
            inst,
            archive_root: config.archive.root.clone(),
            utdate,
            level,
            skip_availability,
            table,
            launcher,
            schedule,
        })
    }

    /// Run the requested lifecycle action.
    pub async fn run(&mut self, action: LifecycleAction) -> Result<LifecycleOutcome> {
        match action {
            LifecycleAction::Status => self.status(),
            LifecycleAction::Start => self.start().await,
            LifecycleAction::Stop => self.stop(),
            LifecycleAction::Restart => {
                // Directory/command resolution happens once for the whole
                // restart, before any process action.
                let resolved = self.resolve()?;
                self.stop()?;
                self.launch_and_confirm(&resolved).await
            }
        }
    }

    /// Read-only projection of the current state; no transition.
    fn status(&mut self) -> Result<LifecycleOutcome> {
        let matches = self.scan()?;
        Ok(LifecycleOutcome::Processes(matches))
    }

    /// Start the pipeline unless it is already running or gated off.
    ///
    /// The scan comes first: an already-running pipeline is an idempotent
    /// no-op and skips directory resolution entirely.
    async fn start(&mut self) -> Result<LifecycleOutcome> {
        let existing = self.scan()?;
        if !existing.is_empty() {
            info!(
                instrument = %self.instrument,
                pids = ?existing.iter().map(|m| m.pid).collect::<Vec<_>>(),
                "pipeline already running"
            );
            return Ok(LifecycleOutcome::Processes(existing));
        }

        let resolved = self.resolve()?;
        self.launch_and_confirm(&resolved).await
    }

    /// Gate, launch detached, then re-scan to confirm.
    async fn launch_and_confirm(&mut self, resolved: &ResolvedPipeline) -> Result<LifecycleOutcome> {
        if !self.skip_availability
            && !check_available(self.schedule, &self.instrument, &self.utdate).await
        {
            info!(instrument = %self.instrument, "not starting: instrument not available");
            return Ok(LifecycleOutcome::NotAvailable);
        }

        self.launcher.launch(&resolved.argv, &resolved.output_dir)?;

        // Re-discover through the locator; no handle is kept from launch.
        let matches = self.scan()?;
        if matches.is_empty() {
            warn!(instrument = %self.instrument, "pipeline not visible after launch");
        }
        Ok(LifecycleOutcome::Processes(matches))
    }

    /// Terminate every matched pid. Does not wait for exit confirmation;
    /// the post-condition is treated as stopped.
    fn stop(&mut self) -> Result<LifecycleOutcome> {
        let matches = self.scan()?;
        if matches.is_empty() {
            info!(instrument = %self.instrument, "pipeline is not running");
            return Ok(LifecycleOutcome::Processes(vec![]));
        }

        for proc in &matches {
            self.table.terminate(proc.pid)?;
        }

        Ok(LifecycleOutcome::Processes(vec![]))
    }

    /// The process table backing this controller.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Consume the controller, handing back its launcher.
    pub fn into_launcher(self) -> L {
        self.launcher
    }

    /// Fresh snapshot + signature match.
    fn scan(&mut self) -> Result<Vec<ProcessRecord>> {
        let signature = self.signature();
        let snapshot = self.table.snapshot()?;
        let owner = self.table.current_user().to_string();
        Ok(find(&signature, &snapshot, &owner))
    }

    fn signature(&self) -> ProcessSignature {
        ProcessSignature::new(
            self.inst.pipeline.clone(),
            self.utdate.clone(),
            self.inst.extras.clone(),
        )
    }

    /// Resolve source/output directories and the pipeline argument vector.
    ///
    /// The source directory must already exist; the output directory is
    /// created recursively. Both failures are fatal configuration errors.
    pub fn resolve(&self) -> Result<ResolvedPipeline> {
        let source_dir = self
            .archive_root
            .join(&self.instrument)
            .join(&self.utdate)
            .join("lev0");
        if !source_dir.is_dir() {
            return Err(DrpError::MissingDirectory(source_dir));
        }

        let output_dir = self
            .inst
            .output_root
            .join(&self.utdate)
            .join(format!("lev{}", self.level));
        fs::create_dir_all(&output_dir)?;

        let argv = resolve_command(
            self.inst.command_for_level(self.level),
            &source_dir.to_string_lossy(),
            self.inst.config_for_level(self.level),
        )?;

        Ok(ResolvedPipeline {
            source_dir,
            output_dir,
            argv,
        })
    }
}

/// Substitute the `DIRECTORY` and `DRP_CONFIG` placeholder tokens in the
/// configured command template, then tokenize on whitespace.
fn resolve_command(template: &str, source_dir: &str, drp_config: &str) -> Result<Vec<String>> {
    if template.trim().is_empty() {
        return Err(DrpError::ConfigError(
            "pipeline command template is empty for this level".to_string(),
        ));
    }

    let expanded = template
        .replace("DIRECTORY", source_dir)
        .replace("DRP_CONFIG", drp_config);

    Ok(expanded.split_whitespace().map(str::to_string).collect())
}
