// src/supervisor/signature.rs

//! Token set identifying one running pipeline instance, and the pure
//! command-line matcher over it.

/// Identifies what a "running instance" looks like among all OS processes.
///
/// Built once per `manage` invocation from the instrument config and the
/// requested UT date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSignature {
    /// The pipeline executable/command token.
    pub primary: String,

    /// The UT date token (`YYYYMMDD`).
    pub date: String,

    /// Extra match tokens (e.g. helper/watchdog process names).
    pub extras: Vec<String>,
}

impl ProcessSignature {
    pub fn new(primary: impl Into<String>, date: impl Into<String>, extras: Vec<String>) -> Self {
        Self {
            primary: primary.into(),
            date: date.into(),
            extras,
        }
    }

    /// True if the command line matches either the primary or the extra rule.
    pub fn matches(&self, cmdline: &[String]) -> bool {
        self.matches_primary(cmdline) || self.matches_extra(cmdline)
    }

    /// Primary rule: both the primary token and the date token appear as a
    /// substring of some argument. The two tokens may hit different
    /// arguments (logical AND over tokens, OR over arguments).
    pub fn matches_primary(&self, cmdline: &[String]) -> bool {
        let has_primary = cmdline.iter().any(|arg| arg.contains(&self.primary));
        let has_date = cmdline.iter().any(|arg| arg.contains(&self.date));
        has_primary && has_date
    }

    /// Extra rule: any argument contains any one of the extra tokens.
    pub fn matches_extra(&self, cmdline: &[String]) -> bool {
        cmdline
            .iter()
            .any(|arg| self.extras.iter().any(|extra| arg.contains(extra)))
    }
}
