// src/config/validate.rs

use crate::config::model::{Config, RawConfig};
use crate::errors::{DrpError, Result};

impl TryFrom<RawConfig> for Config {
    type Error = DrpError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(Config::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfig) -> Result<()> {
    ensure_has_instruments(cfg)?;
    validate_instruments(cfg)?;
    Ok(())
}

fn ensure_has_instruments(cfg: &RawConfig) -> Result<()> {
    if cfg.instrument.is_empty() {
        return Err(DrpError::ConfigError(
            "config must contain at least one [instrument.<NAME>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_instruments(cfg: &RawConfig) -> Result<()> {
    for (name, inst) in cfg.instrument.iter() {
        if name.trim().is_empty() {
            return Err(DrpError::ConfigError(
                "instrument name must not be blank".to_string(),
            ));
        }
        if inst.account.trim().is_empty() {
            return Err(DrpError::ConfigError(format!(
                "instrument '{name}' is missing `account`"
            )));
        }
        if inst.pipeline.trim().is_empty() {
            return Err(DrpError::ConfigError(format!(
                "instrument '{name}' is missing `pipeline`"
            )));
        }
    }
    Ok(())
}

/// Check that the invoking user matches the instrument's configured account.
///
/// An ownership mismatch is a configuration error: the supervisor must never
/// act on processes it does not own.
pub fn verify_account(instrument: &str, expected: &str, actual: &str) -> Result<()> {
    if expected != actual {
        return Err(DrpError::AccountMismatch {
            instrument: instrument.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{InstrumentConfig, RawConfig};

    fn minimal_instrument() -> InstrumentConfig {
        InstrumentConfig {
            account: "kcwieng".to_string(),
            pipeline: "kcwidrp".to_string(),
            output_root: "/drp/kcwi".into(),
            command_lev1: "startup -c DRP_CONFIG DIRECTORY".to_string(),
            command_lev2: String::new(),
            config_lev1: "kcwi_lev1.cfg".to_string(),
            config_lev2: String::new(),
            extras: vec![],
            file_root: "KB.".to_string(),
            setup_command: String::new(),
            reduce_command: String::new(),
        }
    }

    #[test]
    fn empty_instrument_table_is_rejected() {
        let raw = RawConfig {
            archive: Default::default(),
            schedule: Default::default(),
            ingest: Default::default(),
            instrument: Default::default(),
        };
        assert!(matches!(
            Config::try_from(raw),
            Err(DrpError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_account_is_rejected() {
        let mut inst = minimal_instrument();
        inst.account = String::new();
        let mut instruments = std::collections::BTreeMap::new();
        instruments.insert("KCWI".to_string(), inst);
        let raw = RawConfig {
            archive: Default::default(),
            schedule: Default::default(),
            ingest: Default::default(),
            instrument: instruments,
        };
        assert!(Config::try_from(raw).is_err());
    }

    #[test]
    fn account_mismatch_is_an_error() {
        let err = verify_account("KCWI", "kcwieng", "someone").unwrap_err();
        assert!(matches!(err, DrpError::AccountMismatch { .. }));
    }

    #[test]
    fn unknown_instrument_lookup_fails() {
        let mut instruments = std::collections::BTreeMap::new();
        instruments.insert("KCWI".to_string(), minimal_instrument());
        let raw = RawConfig {
            archive: Default::default(),
            schedule: Default::default(),
            ingest: Default::default(),
            instrument: instruments,
        };
        let cfg = Config::try_from(raw).unwrap();
        assert!(cfg.instrument("kcwi").is_ok());
        assert!(matches!(
            cfg.instrument("MOSFIRE"),
            Err(DrpError::UnknownInstrument(_))
        ));
    }
}
