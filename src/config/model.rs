// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::{DrpError, Result};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [archive]
/// root = "/koadata"
///
/// [schedule]
/// url = "https://telescope/api/?"
///
/// [ingest]
/// url = "https://rti/api/ingest"
/// user = "rti"
/// password = "secret"
///
/// [instrument.KCWI]
/// account = "kcwieng"
/// pipeline = "kcwidrp"
/// output_root = "/drp/kcwi"
/// command_lev1 = "startup -c DRP_CONFIG DIRECTORY"
/// config_lev1 = "kcwi_lev1.cfg"
/// extras = ["kcwi_watchdog"]
/// ```
///
/// This raw form is what `serde` deserializes; semantic validation turns it
/// into a [`Config`] via `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    /// Read-source root for raw (lev0) data, from `[archive]`.
    #[serde(default)]
    pub archive: ArchiveSection,

    /// Scheduling-service settings from `[schedule]`.
    #[serde(default)]
    pub schedule: ScheduleSection,

    /// Ingestion-service settings from `[ingest]`.
    #[serde(default)]
    pub ingest: IngestSection,

    /// All instruments from `[instrument.<NAME>]`.
    ///
    /// Keys are the instrument names (e.g. `"KCWI"`, `"NIRES"`).
    #[serde(default)]
    pub instrument: BTreeMap<String, InstrumentConfig>,
}

/// Validated configuration, produced by `TryFrom<RawConfig>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub archive: ArchiveSection,
    pub schedule: ScheduleSection,
    pub ingest: IngestSection,
    pub instrument: BTreeMap<String, InstrumentConfig>,
}

impl Config {
    /// Construct without re-running validation. Internal use only;
    /// external callers go through `TryFrom<RawConfig>`.
    pub(crate) fn new_unchecked(raw: RawConfig) -> Self {
        Self {
            archive: raw.archive,
            schedule: raw.schedule,
            ingest: raw.ingest,
            instrument: raw.instrument,
        }
    }

    /// Look up an instrument by name (case-insensitive, stored uppercase).
    pub fn instrument(&self, name: &str) -> Result<&InstrumentConfig> {
        let key = name.to_uppercase();
        self.instrument
            .get(&key)
            .ok_or(DrpError::UnknownInstrument(key))
    }

    /// Configured instrument names, in stable (sorted) order.
    pub fn instrument_names(&self) -> impl Iterator<Item = &str> {
        self.instrument.keys().map(String::as_str)
    }
}

/// `[archive]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ArchiveSection {
    /// Root directory under which raw lev0 data lives, laid out as
    /// `<root>/<INSTRUMENT>/<YYYYMMDD>/lev0`.
    #[serde(default)]
    pub root: PathBuf,
}

/// `[schedule]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScheduleSection {
    /// Base URL of the telescope scheduling API. Query parameters are
    /// appended directly, so a trailing `?` or `&` is expected.
    #[serde(default)]
    pub url: String,
}

/// `[ingest]` section.
///
/// Credentials and override flags are passed verbatim to the ingestion
/// service on every notification.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestSection {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Ingestion-type tag sent with every notification.
    #[serde(default = "default_ingesttype")]
    pub ingesttype: String,

    #[serde(default)]
    pub reingest: bool,

    #[serde(default)]
    pub testonly: bool,

    #[serde(default)]
    pub dev: bool,
}

fn default_ingesttype() -> String {
    "lev2".to_string()
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: String::new(),
            password: String::new(),
            ingesttype: default_ingesttype(),
            reingest: false,
            testonly: false,
            dev: false,
        }
    }
}

/// `[instrument.<NAME>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    /// Account that must own the pipeline (and be the invoking user).
    pub account: String,

    /// Primary signature token: the pipeline executable/command name.
    pub pipeline: String,

    /// Root directory for reduced output, laid out as
    /// `<output_root>/<YYYYMMDD>/lev<N>`.
    #[serde(default)]
    pub output_root: PathBuf,

    /// Pipeline command template for level 1. The tokens `DIRECTORY` and
    /// `DRP_CONFIG` are replaced with the resolved source directory and
    /// the level's sub-configuration name.
    #[serde(default)]
    pub command_lev1: String,

    /// Pipeline command template for level 2.
    #[serde(default)]
    pub command_lev2: String,

    /// Sub-configuration name for level 1.
    #[serde(default)]
    pub config_lev1: String,

    /// Sub-configuration name for level 2.
    #[serde(default)]
    pub config_lev2: String,

    /// Extra signature match tokens (e.g. watchdog helper processes).
    #[serde(default)]
    pub extras: Vec<String>,

    /// Raw-file name prefix used by setup/discovery (e.g. `"KB."`).
    #[serde(default)]
    pub file_root: String,

    /// Setup command template. The tokens `INPUT`, `ROOT` and `SETUP_DIR`
    /// are replaced before execution.
    #[serde(default)]
    pub setup_command: String,

    /// Command head used for each discovered reduction job.
    #[serde(default)]
    pub reduce_command: String,
}

impl InstrumentConfig {
    /// Pipeline command template for the given processing level.
    pub fn command_for_level(&self, level: u8) -> &str {
        match level {
            2 => &self.command_lev2,
            _ => &self.command_lev1,
        }
    }

    /// Sub-configuration name for the given processing level.
    pub fn config_for_level(&self, level: u8) -> &str {
        match level {
            2 => &self.config_lev2,
            _ => &self.config_lev1,
        }
    }
}
