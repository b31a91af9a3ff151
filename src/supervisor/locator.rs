// src/supervisor/locator.rs

//! Pure process location over an explicit process-table snapshot.
//!
//! The snapshot is an input parameter rather than a live OS read so that
//! matching is testable without a real process table; the production caller
//! obtains the snapshot from [`crate::supervisor::ProcessTable::snapshot`].

use std::collections::HashSet;

use tracing::{info, warn};

use crate::supervisor::process_table::ProcessRecord;
use crate::supervisor::signature::ProcessSignature;

/// Return every process in `snapshot` owned by `owner` whose command line
/// matches `signature`, deduplicated by pid.
///
/// Zero matches is a normal outcome ("not running"). More than one match is
/// reported as a warning but the full set is returned; the caller may act on
/// all of them (e.g. `stop` terminates every matched pid).
pub fn find(
    signature: &ProcessSignature,
    snapshot: &[ProcessRecord],
    owner: &str,
) -> Vec<ProcessRecord> {
    let mut seen: HashSet<u32> = HashSet::new();
    let mut matches = Vec::new();

    for proc in snapshot {
        if proc.owner != owner {
            continue;
        }
        if !signature.matches(&proc.cmdline) {
            continue;
        }
        if seen.insert(proc.pid) {
            matches.push(proc.clone());
        }
    }

    match matches.len() {
        0 => info!(primary = %signature.primary, date = %signature.date, "no matching processes found"),
        1 => info!(pid = matches[0].pid, "found matching process"),
        n => warn!(
            count = n,
            pids = ?matches.iter().map(|m| m.pid).collect::<Vec<_>>(),
            "multiple matching processes found"
        ),
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pid: u32, owner: &str, cmdline: &[&str]) -> ProcessRecord {
        ProcessRecord {
            pid,
            owner: owner.to_string(),
            cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn sig() -> ProcessSignature {
        ProcessSignature::new("kcwidrp", "20240101", vec!["kcwi_watchdog".to_string()])
    }

    #[test]
    fn filters_by_owner() {
        let snapshot = vec![
            record(10, "kcwieng", &["kcwidrp", "20240101"]),
            record(11, "root", &["kcwidrp", "20240101"]),
        ];
        let found = find(&sig(), &snapshot, "kcwieng");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pid, 10);
    }

    #[test]
    fn zero_matches_is_empty_not_error() {
        let snapshot = vec![record(10, "kcwieng", &["bash"])];
        assert!(find(&sig(), &snapshot, "kcwieng").is_empty());
    }

    #[test]
    fn unions_primary_and_extra_matches() {
        let snapshot = vec![
            record(10, "kcwieng", &["kcwidrp", "-d", "20240101"]),
            record(11, "kcwieng", &["kcwi_watchdog"]),
            record(12, "kcwieng", &["vim", "notes.txt"]),
        ];
        let found = find(&sig(), &snapshot, "kcwieng");
        let pids: Vec<u32> = found.iter().map(|m| m.pid).collect();
        assert_eq!(pids, vec![10, 11]);
    }

    #[test]
    fn dedups_by_pid_when_both_rules_hit() {
        // One process matching both the primary and the extra rule must
        // appear only once.
        let snapshot = vec![record(
            10,
            "kcwieng",
            &["kcwidrp", "20240101", "kcwi_watchdog"],
        )];
        let found = find(&sig(), &snapshot, "kcwieng");
        assert_eq!(found.len(), 1);
    }
}
