// src/dispatch/setup.rs

//! Runs the external instrument-setup tool that classifies raw files into
//! job description files.
//!
//! The setup tool itself is an external collaborator; this module only owns
//! the subprocess invocation. A non-zero exit here is a setup error and
//! fatal to the dispatch invocation, unlike per-job failures later on.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::info;

use crate::config::model::InstrumentConfig;
use crate::errors::{DrpError, Result};

/// Subdirectory of the output root where job description files land.
pub const SETUP_SUBDIR: &str = "setups";

/// Run the configured setup command for `inst`, logging both output streams
/// to `<output>/setup.log`.
///
/// Placeholders in the template:
/// - `INPUT`: the raw-file input directory
/// - `ROOT`: the raw-file name prefix
/// - `SETUP_DIR`: the directory job files are written to
pub async fn run_setup(
    inst: &InstrumentConfig,
    input: &Path,
    root: &str,
    output: &Path,
) -> Result<()> {
    let setup_dir = output.join(SETUP_SUBDIR);
    std::fs::create_dir_all(&setup_dir)?;

    let argv = resolve_setup_command(&inst.setup_command, input, root, &setup_dir)?;
    let (head, rest) = argv
        .split_first()
        .ok_or_else(|| DrpError::ConfigError("setup command is empty".to_string()))?;

    let log_path = output.join("setup.log");
    let log = std::fs::File::create(&log_path)?;
    let log_err = log.try_clone()?;

    info!(cmd = ?argv, log = %log_path.display(), "running setup");

    let status = Command::new(head)
        .args(rest)
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .status()
        .await?;

    if !status.success() {
        return Err(DrpError::SetupFailed(status.code().unwrap_or(-1)));
    }

    info!(setup_dir = %setup_dir.display(), "setup complete");
    Ok(())
}

fn resolve_setup_command(
    template: &str,
    input: &Path,
    root: &str,
    setup_dir: &Path,
) -> Result<Vec<String>> {
    if template.trim().is_empty() {
        return Err(DrpError::ConfigError(
            "instrument has no `setup_command` configured".to_string(),
        ));
    }

    let expanded = template
        .replace("INPUT", &input.to_string_lossy())
        .replace("ROOT", root)
        .replace("SETUP_DIR", &setup_dir.to_string_lossy());

    Ok(expanded.split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_template_substitutes_all_placeholders() {
        let argv = resolve_setup_command(
            "pipeline_setup INPUT --root ROOT --output SETUP_DIR",
            Path::new("/raw"),
            "KB.",
            Path::new("/out/setups"),
        )
        .unwrap();
        assert_eq!(
            argv,
            vec![
                "pipeline_setup",
                "/raw",
                "--root",
                "KB.",
                "--output",
                "/out/setups"
            ]
        );
    }

    #[test]
    fn blank_setup_template_is_a_config_error() {
        let err = resolve_setup_command("", Path::new("/raw"), "KB.", Path::new("/o"));
        assert!(matches!(err, Err(DrpError::ConfigError(_))));
    }
}
