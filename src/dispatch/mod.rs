// src/dispatch/mod.rs

//! Parallel job dispatcher.
//!
//! The upstream setup step classifies raw files into per-configuration job
//! description files; this module discovers those files, turns each into a
//! [`JobDescriptor`], and runs them with bounded parallelism:
//!
//! - [`setup`] invokes the external setup tool as a subprocess.
//! - [`discovery`] enumerates the generated job files.
//! - [`pool`] is the bounded-concurrency worker pool.
//! - [`runner`] runs one job's subprocess with per-job logging; the
//!   [`JobRunner`] trait lets tests substitute a fake.

pub mod discovery;
pub mod job;
pub mod pool;
pub mod runner;
pub mod setup;

pub use discovery::discover_jobs;
pub use job::{DispatchResult, JobDescriptor};
pub use pool::{default_concurrency, run_pool};
pub use runner::{JobRunner, SubprocessRunner};
pub use setup::run_setup;
