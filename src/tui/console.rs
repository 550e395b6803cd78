// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Rendering seam between the session and the terminal.

use async_trait::async_trait;

use crate::agent::ProtocolMessage;
use crate::config::Verbosity;

/// Kind of a front-end status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Success,
    Warning,
    Error,
}

/// Everything the session shows to, or asks of, the human.
///
/// Implementations must be shareable with the stderr drainer task.
#[async_trait]
pub trait Console: Send + Sync {
    /// Render a protocol message under the given verbosity threshold.
    fn agent_message(&self, message: &ProtocolMessage, verbosity: Verbosity);

    /// Non-protocol stdout line from the agent.
    fn raw_line(&self, line: &str);

    /// Line from the agent's stderr.
    fn agent_stderr(&self, line: &str);

    /// Front-end status line.
    fn notice(&self, kind: Notice, text: &str);

    /// Ask a yes/no question. Anything but an explicit yes is a no.
    async fn confirm(&self, question: &str) -> bool;
}
