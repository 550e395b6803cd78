// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Expiration sweep over cached session logs.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// What a sweep did.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Expiration was 0 and nothing was scanned.
    pub skipped: bool,
    /// The cache directory does not exist.
    pub missing: bool,
    pub deleted: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, io::Error)>,
}

/// Delete `*.json` files in `dir` last modified more than `expiration_days`
/// before `now`.
///
/// Only a failure to list the directory is an error. Per-file failures are
/// collected in the report.
pub fn sweep_expired(dir: &Path, expiration_days: u32, now: SystemTime) -> io::Result<SweepReport> {
    let mut report = SweepReport::default();
    if expiration_days == 0 {
        report.skipped = true;
        return Ok(report);
    }

    let max_age = Duration::from_secs(u64::from(expiration_days) * SECONDS_PER_DAY);
    let threshold = now.checked_sub(max_age).unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            report.missing = true;
            return Ok(report);
        }
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.failures.push((dir.to_path_buf(), e));
                continue;
            }
        };

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| {
            if m.is_file() {
                m.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(e) => {
                report.failures.push((path, e));
                continue;
            }
        };

        if modified < threshold {
            match std::fs::remove_file(&path) {
                Ok(()) => report.deleted.push(path),
                Err(e) => report.failures.push((path, e)),
            }
        }
    }

    report.deleted.sort();
    Ok(report)
}
