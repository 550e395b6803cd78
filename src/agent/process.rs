// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent subprocess lifecycle.
//!
//! The [`ProcessManager`] owns exactly one agent process: it spawns it with
//! three piped streams, drains stderr on a background task from the moment
//! the process starts, hands out the stdout line stream once, writes
//! commands to stdin, and shuts the process down in two phases (close stdin,
//! wait out a grace period, then kill).

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use tracing::{debug, info, warn};

use super::invocation::{AgentInvocation, StartParams};
use super::lines::AgentLines;
use super::protocol::CommandMessage;
use crate::error::ProcessError;
use crate::tui::Console;

/// How long `stop` waits for the agent to exit after stdin is closed.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// How long `stop` waits for the stderr drainer to flush after exit.
const STDERR_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest stderr line forwarded; longer lines are dropped.
const STDERR_LINE_LIMIT: usize = 64 * 1024;

/// How the agent ended when it was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// There was no process to stop.
    NotStarted,
    /// The process exited on its own within the grace period.
    /// `None` when it was ended by a signal.
    Exited(Option<i32>),
    /// The process had to be killed.
    Killed,
}

/// Where commands for the agent are written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Write one command as a single newline-terminated line.
    async fn send_command(&self, command: &CommandMessage) -> Result<(), ProcessError>;
}

/// Owner of one agent subprocess.
pub struct ProcessManager {
    grace: Duration,
    /// Receives stderr lines for display; tracing always gets them.
    stderr_console: Option<Arc<dyn Console>>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr_task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl ProcessManager {
    /// Create a manager with the default five second stop grace period.
    pub fn new() -> Self {
        Self::with_grace(DEFAULT_STOP_GRACE)
    }

    /// Create a manager with a custom stop grace period.
    pub fn with_grace(grace: Duration) -> Self {
        Self {
            grace,
            stderr_console: None,
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
            stderr_task: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Show agent stderr lines on the given console.
    pub fn with_stderr_console(mut self, console: Arc<dyn Console>) -> Self {
        self.stderr_console = Some(console);
        self
    }

    /// Stop grace period.
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// OS process id of the running agent, if any.
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(|c| c.id())
    }

    /// Whether an agent has been started and not yet stopped.
    pub async fn is_running(&self) -> bool {
        self.child.lock().await.is_some()
    }

    /// Spawn the agent described by `params`.
    #[cfg_attr(feature = "telemetry", instrument(skip(self, params), fields(hash = %params.session_hash)))]
    pub async fn start(&self, params: &StartParams) -> Result<(), ProcessError> {
        let invocation = AgentInvocation::build(params)?;
        self.spawn(&invocation).await
    }

    /// Spawn a prebuilt invocation.
    pub async fn spawn(&self, invocation: &AgentInvocation) -> Result<(), ProcessError> {
        let mut child_slot = self.child.lock().await;
        if child_slot.is_some() {
            return Err(ProcessError::Start("agent already running".to_string()));
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .current_dir(&invocation.current_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ProcessError::Start(format!(
                "failed to spawn {}: {}",
                invocation.program.to_string_lossy(),
                e
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::Start("failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::Start("failed to get stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProcessError::Start("failed to get stderr".to_string()))?;

        info!(pid = ?child.id(), program = %invocation.program.to_string_lossy(), "Agent started");

        let task = tokio::spawn(drain_stderr(stderr, self.stderr_console.clone()));

        *self.stdin.lock().await = Some(stdin);
        *self.stdout.lock().await = Some(stdout);
        *self.stderr_task.lock().await = Some(task);
        *child_slot = Some(child);
        self.started.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Take the stdout line stream. Only the first call succeeds.
    pub async fn take_stdout_lines(&self) -> Result<AgentLines, ProcessError> {
        match self.stdout.lock().await.take() {
            Some(stdout) => Ok(AgentLines::new(stdout)),
            None if self.started.load(Ordering::SeqCst) => Err(ProcessError::StdoutTaken),
            None => Err(ProcessError::NotStarted),
        }
    }

    /// Close stdin, wait up to the grace period, then kill.
    ///
    /// Never fails and never blocks past the grace period plus the kill.
    /// Calls after the first return [`StopOutcome::NotStarted`].
    #[cfg_attr(feature = "telemetry", instrument(skip(self)))]
    pub async fn stop(&self) -> StopOutcome {
        // Closing stdin is the end-of-input signal for a well-behaved agent.
        drop(self.stdin.lock().await.take());

        let Some(mut child) = self.child.lock().await.take() else {
            return StopOutcome::NotStarted;
        };

        let outcome = match timeout(self.grace, child.wait()).await {
            Ok(Ok(status)) => {
                info!(code = ?status.code(), "Agent exited");
                StopOutcome::Exited(status.code())
            }
            Ok(Err(e)) => {
                warn!("Failed to wait for agent: {e}. Killing it.");
                kill(&mut child).await
            }
            Err(_) => {
                warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "Agent did not exit within the grace period. Killing it."
                );
                kill(&mut child).await
            }
        };

        if let Some(mut task) = self.stderr_task.lock().await.take() {
            if timeout(STDERR_FLUSH_TIMEOUT, &mut task).await.is_err() {
                task.abort();
            }
        }

        outcome
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSink for ProcessManager {
    async fn send_command(&self, command: &CommandMessage) -> Result<(), ProcessError> {
        let line = command
            .to_line()
            .map_err(|e| ProcessError::Write(format!("failed to encode command: {e}")))?;

        let mut guard = self.stdin.lock().await;
        let stdin = match guard.as_mut() {
            Some(stdin) => stdin,
            None if self.started.load(Ordering::SeqCst) => {
                return Err(ProcessError::Write("agent stdin is closed".to_string()))
            }
            None => return Err(ProcessError::NotStarted),
        };

        debug!(command = %line, "Sending command to agent");

        let mut bytes = line.into_bytes();
        bytes.push(b'\n');
        stdin
            .write_all(&bytes)
            .await
            .map_err(|e| ProcessError::Write(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| ProcessError::Write(e.to_string()))?;

        Ok(())
    }
}

async fn kill(child: &mut Child) -> StopOutcome {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill agent: {e}");
    }
    StopOutcome::Killed
}

/// Forward stderr lines until the pipe closes.
///
/// Undecodable bytes and over-long lines never stop the drain; only end of
/// stream or a read error does.
async fn drain_stderr(stderr: ChildStderr, console: Option<Arc<dyn Console>>) {
    let mut lines = AgentLines::with_limit(stderr, STDERR_LINE_LIMIT).skip_long_lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(target: "og::agent::stderr", "{line}");
                if let Some(console) = &console {
                    console.agent_stderr(&line);
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Agent stderr read failed: {e}");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ProtocolMessage;
    use crate::config::Verbosity;
    use crate::tui::Notice;
    use std::ffi::OsString;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex as StdMutex;
    use std::time::Instant;
    use tempfile::TempDir;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("agent.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn invocation(program: &Path, dir: &Path) -> AgentInvocation {
        AgentInvocation {
            program: program.as_os_str().to_os_string(),
            args: vec![OsString::from("--session-hash"), OsString::from("abc")],
            env: Vec::new(),
            current_dir: dir.to_path_buf(),
        }
    }

    #[derive(Default)]
    struct StderrCapture {
        lines: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl Console for StderrCapture {
        fn agent_message(&self, _message: &ProtocolMessage, _verbosity: Verbosity) {}
        fn raw_line(&self, _line: &str) {}
        fn agent_stderr(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
        fn notice(&self, _kind: Notice, _text: &str) {}
        async fn confirm(&self, _question: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_reads_stdout_and_exits_cleanly() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), r#"echo "hello $1 $2""#);

        let pm = ProcessManager::new();
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        assert!(pm.is_running().await);

        let mut lines = pm.take_stdout_lines().await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("hello --session-hash abc"));
        assert_eq!(lines.next_line().await.unwrap(), None);

        assert_eq!(pm.stop().await, StopOutcome::Exited(Some(0)));
        assert!(!pm.is_running().await);
    }

    #[tokio::test]
    async fn test_stdout_can_be_taken_once() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exit 0");

        let pm = ProcessManager::new();
        assert!(matches!(pm.take_stdout_lines().await, Err(ProcessError::NotStarted)));

        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        assert!(pm.take_stdout_lines().await.is_ok());
        assert!(matches!(pm.take_stdout_lines().await, Err(ProcessError::StdoutTaken)));
        pm.stop().await;
    }

    #[tokio::test]
    async fn test_commands_reach_agent_stdin() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), r#"read line; echo "got $line""#);

        let pm = ProcessManager::new();
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        let mut lines = pm.take_stdout_lines().await.unwrap();

        pm.send_command(&CommandMessage::UserApprovalResponse { approved: true })
            .await
            .unwrap();
        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some(r#"got {"type":"user_approval_response","approved":true}"#)
        );

        pm.stop().await;
    }

    #[tokio::test]
    async fn test_stdin_close_lets_agent_exit() {
        let temp = TempDir::new().unwrap();
        // Exits only once stdin reaches EOF.
        let agent = script(temp.path(), "cat > /dev/null; exit 3");

        let pm = ProcessManager::new();
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();

        let started = Instant::now();
        assert_eq!(pm.stop().await, StopOutcome::Exited(Some(3)));
        assert!(started.elapsed() < DEFAULT_STOP_GRACE);
    }

    #[tokio::test]
    async fn test_unresponsive_agent_is_killed_after_grace() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exec sleep 30");

        let pm = ProcessManager::with_grace(Duration::from_millis(200));
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();

        let started = Instant::now();
        assert_eq!(pm.stop().await, StopOutcome::Killed);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!pm.is_running().await);
    }

    #[tokio::test]
    async fn test_stop_without_start_and_twice() {
        let pm = ProcessManager::new();
        assert_eq!(pm.stop().await, StopOutcome::NotStarted);

        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exit 0");
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        assert!(matches!(pm.stop().await, StopOutcome::Exited(_)));
        assert_eq!(pm.stop().await, StopOutcome::NotStarted);
    }

    #[tokio::test]
    async fn test_send_after_stop_is_write_error() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exit 0");

        let pm = ProcessManager::new();
        let err = pm.send_command(&CommandMessage::ExecuteRecipe).await.unwrap_err();
        assert!(matches!(err, ProcessError::NotStarted));

        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        pm.stop().await;

        let err = pm.send_command(&CommandMessage::ExecuteRecipe).await.unwrap_err();
        assert!(matches!(err, ProcessError::Write(_)));
    }

    #[tokio::test]
    async fn test_send_to_exited_agent_fails() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exit 0");

        let pm = ProcessManager::new();
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        let mut lines = pm.take_stdout_lines().await.unwrap();
        assert_eq!(lines.next_line().await.unwrap(), None);

        // The reader end is gone once the agent has exited; retry until the
        // broken pipe surfaces.
        let mut result = Ok(());
        for _ in 0..50 {
            result = pm.send_command(&CommandMessage::ExecuteSingleAction).await;
            if result.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(matches!(result, Err(ProcessError::Write(_))));
        pm.stop().await;
    }

    #[tokio::test]
    async fn test_missing_program_is_start_error() {
        let temp = TempDir::new().unwrap();
        let pm = ProcessManager::new();
        let err = pm
            .spawn(&invocation(&temp.path().join("no-such-agent"), temp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Start(_)));
        assert_eq!(pm.stop().await, StopOutcome::NotStarted);
    }

    #[tokio::test]
    async fn test_bad_working_directory_is_start_error() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "exit 0");
        let mut inv = invocation(&agent, temp.path());
        inv.current_dir = temp.path().join("missing");

        let pm = ProcessManager::new();
        assert!(matches!(pm.spawn(&inv).await, Err(ProcessError::Start(_))));
    }

    #[tokio::test]
    async fn test_stderr_is_drained_to_console() {
        let temp = TempDir::new().unwrap();
        let agent = script(temp.path(), "echo 'warming up' >&2; echo 'second' >&2; echo done");

        let capture = Arc::new(StderrCapture::default());
        let pm = ProcessManager::new().with_stderr_console(capture.clone());
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();

        let mut lines = pm.take_stdout_lines().await.unwrap();
        while lines.next_line().await.unwrap().is_some() {}
        pm.stop().await;

        assert_eq!(*capture.lines.lock().unwrap(), vec!["warming up", "second"]);
    }

    #[tokio::test]
    async fn test_heavy_stderr_does_not_stall_stdout() {
        let temp = TempDir::new().unwrap();
        // Far more than a pipe buffer of stderr before the first stdout line.
        let agent = script(
            temp.path(),
            "i=0; while [ $i -lt 5000 ]; do echo \"diagnostic line $i padding padding padding\" >&2; i=$((i+1)); done; echo ready",
        );

        let pm = ProcessManager::new();
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        let mut lines = pm.take_stdout_lines().await.unwrap();

        let line = timeout(Duration::from_secs(20), lines.next_line())
            .await
            .expect("stdout stalled")
            .unwrap();
        assert_eq!(line.as_deref(), Some("ready"));
        pm.stop().await;
    }

    #[tokio::test]
    async fn test_stderr_drain_survives_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let agent = script(
            temp.path(),
            r#"printf 'bad \377\n' >&2
i=0; while [ $i -lt 5000 ]; do echo "diagnostic line $i padding padding padding" >&2; i=$((i+1)); done
echo ready"#,
        );

        let capture = Arc::new(StderrCapture::default());
        let pm = ProcessManager::new().with_stderr_console(capture.clone());
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();
        let mut lines = pm.take_stdout_lines().await.unwrap();

        let line = timeout(Duration::from_secs(20), lines.next_line())
            .await
            .expect("stdout stalled")
            .unwrap();
        assert_eq!(line.as_deref(), Some("ready"));
        assert_eq!(pm.stop().await, StopOutcome::Exited(Some(0)));

        let captured = capture.lines.lock().unwrap();
        assert_eq!(captured.len(), 5001);
        assert_eq!(captured[0], "bad \u{FFFD}");
        assert_eq!(captured[5000], "diagnostic line 4999 padding padding padding");
    }

    #[tokio::test]
    async fn test_overlong_stderr_line_is_dropped() {
        let temp = TempDir::new().unwrap();
        let agent = script(
            temp.path(),
            "head -c 100000 /dev/zero | tr '\\0' x >&2; echo >&2; echo after >&2; echo done",
        );

        let capture = Arc::new(StderrCapture::default());
        let pm = ProcessManager::new().with_stderr_console(capture.clone());
        pm.spawn(&invocation(&agent, temp.path())).await.unwrap();

        let mut lines = pm.take_stdout_lines().await.unwrap();
        while lines.next_line().await.unwrap().is_some() {}
        assert_eq!(pm.stop().await, StopOutcome::Exited(Some(0)));

        assert_eq!(*capture.lines.lock().unwrap(), vec!["after"]);
    }
}
