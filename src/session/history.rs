// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Append-only session history and session hashes.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::HistoryError;

/// Hex characters kept from the digest.
pub const SESSION_HASH_LEN: usize = 12;

/// One line of `history.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// RFC 3339 start time
    pub ts: String,
    pub hash: String,
    pub cwd: String,
    pub query: String,
}

/// Short identifier for a session started at `unix_secs`.
pub fn generate_session_hash(query: &str, unix_secs: i64) -> String {
    let digest = Sha256::digest(format!("{query}_{unix_secs}").as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(SESSION_HASH_LEN);
    hex
}

/// Append one record as a JSON line, creating the file and its directory
/// as needed.
pub fn append_record(path: &Path, record: &HistoryRecord) -> Result<(), HistoryError> {
    let io_err = |source| HistoryError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    // A single write keeps each record on its own line.
    file.write_all(line.as_bytes()).map_err(io_err)?;

    Ok(())
}
