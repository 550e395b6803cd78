// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! One OG session from request to shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{Local, SecondsFormat};
use tracing::{debug, info, info_span, warn, Instrument};

use super::cache::sweep_expired;
use super::history::{append_record, generate_session_hash, HistoryRecord};
use super::scratch::ScratchDir;
use crate::agent::{
    MessageProcessor, ProcessManager, SessionOutcome, StartParams, StopOutcome, DEFAULT_STOP_GRACE,
};
use crate::config::{ResolvedConfig, HISTORY_FILE};
use crate::error::{ProcessError, SessionError};
use crate::tui::{Console, Notice};

/// Final line printed after a session that ended without a hard error.
pub const SESSION_ENDED: &str = "🚀 OG session ended.";

/// How a session went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub hash: String,
    pub outcome: SessionOutcome,
    /// Result of the single `stop` call.
    pub shutdown: StopOutcome,
}

impl SessionReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// Runs sessions against one resolved configuration.
pub struct Session {
    config: ResolvedConfig,
    console: Arc<dyn Console>,
    stop_grace: Duration,
}

impl Session {
    pub fn new(config: ResolvedConfig, console: Arc<dyn Console>) -> Self {
        Self {
            config,
            console,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Override the agent shutdown grace period.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Run one session from the process's current directory.
    pub async fn run(&self, query: &str) -> Result<SessionReport, SessionError> {
        let cwd = std::env::current_dir().map_err(|e| SessionError::WorkingDirectory(e.to_string()))?;
        self.run_in(query, &cwd).await
    }

    /// Run one session with `cwd` as the caller's working directory.
    ///
    /// The scratch directory is removed and the agent stopped on every
    /// path out of this function once they have been set up.
    pub async fn run_in(&self, query: &str, cwd: &Path) -> Result<SessionReport, SessionError> {
        let started = Local::now();
        let hash = generate_session_hash(query, started.timestamp());
        let span = info_span!("session", hash = %hash);

        self.run_session(query, cwd, hash, started.to_rfc3339_opts(SecondsFormat::Secs, true))
            .instrument(span)
            .await
    }

    async fn run_session(
        &self,
        query: &str,
        cwd: &Path,
        hash: String,
        ts: String,
    ) -> Result<SessionReport, SessionError> {
        info!(cwd = %cwd.display(), "Session starting");
        debug!(
            timeout_minutes = self.config.session_timeout_minutes,
            "Session timeout is configured but not enforced"
        );

        self.record_history(&hash, &ts, cwd, query);
        self.sweep_cache();

        let _scratch = ScratchDir::new(&self.config.scratch_root, &hash).with_console(self.console.clone());

        let mut manager = ProcessManager::with_grace(self.stop_grace);
        if self.config.verbosity.is_debug() {
            manager = manager.with_stderr_console(self.console.clone());
        }

        let params = StartParams::from_config(&self.config, &hash, query, cwd);
        manager.start(&params).await.map_err(SessionError::Start)?;

        let result = self.drive(&manager).await;
        let shutdown = manager.stop().await;
        info!(?shutdown, "Agent stopped");

        match result {
            Ok(outcome) => {
                info!(%outcome, "Session finished");
                self.console.notice(Notice::Info, SESSION_ENDED);
                Ok(SessionReport {
                    hash,
                    outcome,
                    shutdown,
                })
            }
            Err(e) => {
                warn!("Session failed: {e}");
                Err(SessionError::Protocol(e))
            }
        }
    }

    async fn drive(&self, manager: &ProcessManager) -> Result<SessionOutcome, ProcessError> {
        let mut lines = manager.take_stdout_lines().await?;
        let processor = MessageProcessor::new(manager, self.console.as_ref(), self.config.verbosity);
        processor.run(&mut lines).await
    }

    fn record_history(&self, hash: &str, ts: &str, cwd: &Path, query: &str) {
        let record = HistoryRecord {
            ts: ts.to_string(),
            hash: hash.to_string(),
            cwd: cwd.display().to_string(),
            query: query.to_string(),
        };

        let path = self.config.data_dir.join(HISTORY_FILE);
        if let Err(e) = append_record(&path, &record) {
            warn!("{e}");
            self.console
                .notice(Notice::Error, &format!("Failed to append history: {e}"));
        }
    }

    fn sweep_cache(&self) {
        let days = self.config.cache_expiration_days;
        let dir = &self.config.cache_dir;

        let report = match sweep_expired(dir, days, SystemTime::now()) {
            Ok(report) => report,
            Err(e) => {
                warn!("Cache sweep failed: {e}");
                self.console.notice(
                    Notice::Warning,
                    &format!("Warning: Failed to clean up old cache files: {e}"),
                );
                return;
            }
        };

        if report.skipped {
            debug!("Cache expiration disabled; skipping sweep");
            return;
        }
        if report.missing {
            debug!(dir = %dir.display(), "Cache directory does not exist");
            return;
        }

        for path in &report.deleted {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            self.console
                .notice(Notice::Success, &format!("Deleted expired file: {name}"));
        }
        for (path, e) in &report.failures {
            warn!(path = %path.display(), "Failed to delete expired file: {e}");
            self.console.notice(
                Notice::Warning,
                &format!("Error deleting expired file {}: {e}", path.display()),
            );
        }
    }
}
