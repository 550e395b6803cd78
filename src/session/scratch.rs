// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-session scratch directory.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::tui::{Console, Notice};

/// Owns `<root>/og/<hash>` and removes it when dropped.
///
/// The agent creates the directory if it needs one; a directory that was
/// never created is not an error.
pub struct ScratchDir {
    path: PathBuf,
    console: Option<Arc<dyn Console>>,
}

impl ScratchDir {
    pub fn new(root: &Path, hash: &str) -> Self {
        Self {
            path: root.join("og").join(hash),
            console: None,
        }
    }

    /// Report removal on the given console.
    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn remove(&self) -> io::Result<()> {
        match std::fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let shown = self.path.display().to_string();
        match self.remove() {
            Ok(()) => {
                debug!(path = %shown, "Removed scratch directory");
                if let Some(console) = &self.console {
                    console.notice(Notice::Success, &format!("Cleaned up temporary directory: {shown}"));
                }
            }
            Err(e) => {
                warn!(path = %shown, "Failed to remove scratch directory: {e}");
                if let Some(console) = &self.console {
                    console.notice(
                        Notice::Error,
                        &format!("Error cleaning up temporary directory {shown}: {e}"),
                    );
                }
            }
        }
    }
}
