// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod ingest;
pub mod logging;
pub mod supervisor;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::{CliArgs, Command, DispatchArgs, ManageArgs};
use crate::config::loader::load_and_validate;
use crate::dispatch::{
    default_concurrency, discover_jobs, run_pool, run_setup, SubprocessRunner,
};
use crate::errors::{DrpError, Result};
use crate::ingest::{HttpIngestTransport, Notifier};
use crate::supervisor::{
    DetachedLauncher, HttpScheduleService, LifecycleController, SysinfoTable,
};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading
/// - the lifecycle controller with its OS-backed process table (`manage`)
/// - setup, discovery, the worker pool and the ingest notifier (`dispatch`)
pub async fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Manage(manage) => run_manage(manage).await,
        Command::Dispatch(dispatch) => run_dispatch(dispatch).await,
    }
}

/// Supervisor path: one lifecycle operation on the singleton pipeline.
async fn run_manage(args: ManageArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;
    let utdate = args.date.clone().unwrap_or_else(cli::default_utdate);

    info!(
        instrument = %args.instrument,
        action = ?args.action,
        %utdate,
        level = args.level,
        "manage"
    );

    let schedule = HttpScheduleService::new(cfg.schedule.url.clone());
    let mut controller = LifecycleController::new(
        &cfg,
        &args.instrument,
        utdate,
        args.level,
        args.skip_availability,
        SysinfoTable::new(),
        DetachedLauncher,
        &schedule,
    )?;

    let outcome = controller.run(args.action).await?;
    Ok(outcome.exit_code(args.action))
}

/// Dispatcher path: setup, discovery, bounded-parallel reduction, ingest
/// notification. Per-job failures do not affect the exit code; only
/// configuration/setup errors do.
async fn run_dispatch(args: DispatchArgs) -> Result<i32> {
    let cfg = load_and_validate(&args.config)?;

    if args.list_instruments {
        for name in cfg.instrument_names() {
            println!("{name}");
        }
        return Ok(0);
    }

    let Some(instrument) = args.instrument.clone() else {
        return Err(DrpError::ConfigError(
            "an instrument is required unless --list-instruments is given".to_string(),
        ));
    };
    let inst = cfg.instrument(&instrument)?;

    let input = match args.input.clone() {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let output: PathBuf = args
        .output
        .clone()
        .unwrap_or_else(|| input.join("redux"));
    let root = args
        .root
        .clone()
        .unwrap_or_else(|| inst.file_root.clone());

    run_setup(inst, &input, &root, &output).await?;
    if args.setup_only {
        info!("setup-only requested; not dispatching jobs");
        return Ok(0);
    }

    let jobs = discover_jobs(&output, &instrument, &inst.reduce_command, args.calib_only)?;
    if jobs.is_empty() {
        warn!("no jobs discovered; nothing to dispatch");
        return Ok(0);
    }

    let concurrency = args.concurrency.unwrap_or_else(default_concurrency);
    let notifier = Notifier::new(
        instrument.to_uppercase(),
        cfg.ingest.clone(),
        Box::new(HttpIngestTransport::new(&cfg.ingest)),
    );

    let results = run_pool(
        jobs,
        concurrency,
        Arc::new(SubprocessRunner),
        Arc::new(notifier),
    )
    .await;

    let failed = results.iter().filter(|r| !r.succeeded).count();
    if failed > 0 {
        warn!(failed, total = results.len(), "some jobs failed; see per-job logs");
    }

    // Partial per-job failure is still a normal completion.
    Ok(0)
}
