// src/supervisor/mod.rs

//! Process supervisor for the single long-running pipeline instance.
//!
//! - [`signature`] defines the token set that identifies a running pipeline
//!   and the pure command-line matcher.
//! - [`locator`] finds matching processes in an explicit process-table
//!   snapshot, so matching stays testable without a real OS.
//! - [`process_table`] is the OS seam: snapshotting and terminating
//!   processes (sysinfo-backed in production, fake in tests).
//! - [`availability`] gates `start` on the external scheduling service.
//! - [`lifecycle`] orchestrates start/stop/restart/status over the above.

pub mod availability;
pub mod lifecycle;
pub mod locator;
pub mod process_table;
pub mod signature;

pub use availability::{check_available, HttpScheduleService, ScheduleService};
pub use lifecycle::{LifecycleController, LifecycleOutcome, ResolvedPipeline};
pub use locator::find;
pub use process_table::{DetachedLauncher, Launcher, ProcessRecord, ProcessTable, SysinfoTable};
pub use signature::ProcessSignature;
