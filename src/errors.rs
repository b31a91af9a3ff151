// src/errors.rs

//! Crate-wide error type and `Result` alias.
//!
//! Only configuration errors propagate as `Err` out of the core operations;
//! external-service failures (availability check, ingest notify) and per-job
//! failures are absorbed at the component boundary and represented as data.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrpError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Instrument {instrument} must run as account '{expected}' (running as '{actual}')")]
    AccountMismatch {
        instrument: String,
        expected: String,
        actual: String,
    },

    #[error("Required directory does not exist: {0}")]
    MissingDirectory(std::path::PathBuf),

    #[error("Setup step failed with exit code {0}")]
    SetupFailed(i32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DrpError>;
