// src/dispatch/discovery.rs

//! Discovery of job description files produced by the setup step.
//!
//! Files matching the per-instrument naming pattern under
//! `<output>/setups/` each become one [`JobDescriptor`] with its own
//! working directory, command and log file.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use tracing::{debug, info, warn};

use crate::dispatch::job::JobDescriptor;
use crate::dispatch::setup::SETUP_SUBDIR;
use crate::errors::{DrpError, Result};

/// Discover the jobs for `instrument` under `output`.
///
/// Each job file `<name>.setup` yields:
/// - `working_output = <output>/redux/<name>`
/// - `log_path       = <output>/redux/<name>.log`
/// - `command        = reduce_command <file> -r <working_output> -o [-c]`
///
/// Results are sorted by file path so discovery order is deterministic.
pub fn discover_jobs(
    output: &Path,
    instrument: &str,
    reduce_command: &str,
    calib_only: bool,
) -> Result<Vec<JobDescriptor>> {
    if reduce_command.trim().is_empty() {
        return Err(DrpError::ConfigError(
            "instrument has no `reduce_command` configured".to_string(),
        ));
    }

    let setup_dir = output.join(SETUP_SUBDIR);
    if !setup_dir.is_dir() {
        warn!(dir = %setup_dir.display(), "setup directory missing; no jobs to dispatch");
        return Ok(vec![]);
    }

    // One job file per identified instrument configuration, e.g.
    // "kcwi_A.setup", "kcwi_B.setup".
    let pattern = format!("{}_?.setup", instrument.to_lowercase());
    let matcher = Glob::new(&pattern)
        .map_err(|e| DrpError::ConfigError(format!("bad job-file pattern '{pattern}': {e}")))?
        .compile_matcher();

    let mut files = Vec::new();
    collect_matching(&setup_dir, &matcher, &mut files)?;
    files.sort();

    info!(count = files.len(), %pattern, "discovered job files");

    let redux = output.join("redux");
    let jobs = files
        .into_iter()
        .filter_map(|file| descriptor_for(&file, &redux, reduce_command, calib_only))
        .collect();

    Ok(jobs)
}

/// Recursively collect files whose *name* matches the pattern.
fn collect_matching(dir: &Path, matcher: &GlobMatcher, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_matching(&path, matcher, out)?;
        } else if path.file_name().is_some_and(|name| matcher.is_match(name)) {
            out.push(path);
        }
    }
    Ok(())
}

fn descriptor_for(
    file: &Path,
    redux: &Path,
    reduce_command: &str,
    calib_only: bool,
) -> Option<JobDescriptor> {
    let Some(stem) = file.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        debug!(file = %file.display(), "skipping job file without a stem");
        return None;
    };

    let working_output = redux.join(&stem);
    let log_path = redux.join(format!("{stem}.log"));

    let mut command = vec![
        reduce_command.to_string(),
        file.to_string_lossy().into_owned(),
        "-r".to_string(),
        working_output.to_string_lossy().into_owned(),
        "-o".to_string(),
    ];
    if calib_only {
        command.push("-c".to_string());
    }

    Some(JobDescriptor {
        source_file: file.to_path_buf(),
        working_output,
        command,
        log_path,
    })
}
