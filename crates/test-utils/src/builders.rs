#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use drpctl::config::{
    ArchiveSection, Config, IngestSection, InstrumentConfig, RawConfig, ScheduleSection,
};

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    raw: RawConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfig {
                archive: ArchiveSection::default(),
                schedule: ScheduleSection::default(),
                ingest: IngestSection::default(),
                instrument: BTreeMap::new(),
            },
        }
    }

    pub fn with_archive_root(mut self, root: impl AsRef<Path>) -> Self {
        self.raw.archive.root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_schedule_url(mut self, url: &str) -> Self {
        self.raw.schedule.url = url.to_string();
        self
    }

    pub fn with_ingest(mut self, ingest: IngestSection) -> Self {
        self.raw.ingest = ingest;
        self
    }

    pub fn with_instrument(mut self, name: &str, inst: InstrumentConfig) -> Self {
        self.raw.instrument.insert(name.to_string(), inst);
        self
    }

    pub fn build(self) -> Config {
        Config::try_from(self.raw).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `InstrumentConfig`.
pub struct InstrumentConfigBuilder {
    inst: InstrumentConfig,
}

impl InstrumentConfigBuilder {
    pub fn new(account: &str, pipeline: &str) -> Self {
        Self {
            inst: InstrumentConfig {
                account: account.to_string(),
                pipeline: pipeline.to_string(),
                output_root: Default::default(),
                command_lev1: format!("{pipeline} -c DRP_CONFIG DIRECTORY"),
                command_lev2: String::new(),
                config_lev1: "lev1.cfg".to_string(),
                config_lev2: "lev2.cfg".to_string(),
                extras: vec![],
                file_root: String::new(),
                setup_command: String::new(),
                reduce_command: "run_pipeline".to_string(),
            },
        }
    }

    pub fn output_root(mut self, root: impl AsRef<Path>) -> Self {
        self.inst.output_root = root.as_ref().to_path_buf();
        self
    }

    pub fn command_lev1(mut self, cmd: &str) -> Self {
        self.inst.command_lev1 = cmd.to_string();
        self
    }

    pub fn command_lev2(mut self, cmd: &str) -> Self {
        self.inst.command_lev2 = cmd.to_string();
        self
    }

    pub fn extra(mut self, token: &str) -> Self {
        self.inst.extras.push(token.to_string());
        self
    }

    pub fn file_root(mut self, root: &str) -> Self {
        self.inst.file_root = root.to_string();
        self
    }

    pub fn setup_command(mut self, cmd: &str) -> Self {
        self.inst.setup_command = cmd.to_string();
        self
    }

    pub fn reduce_command(mut self, cmd: &str) -> Self {
        self.inst.reduce_command = cmd.to_string();
        self
    }

    pub fn build(self) -> InstrumentConfig {
        self.inst
    }
}
