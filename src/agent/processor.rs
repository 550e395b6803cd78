// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The plan/approval state machine.
//!
//! The processor reads agent stdout one line at a time, renders each
//! protocol message, and answers the messages that need a decision:
//!
//! | Message                     | Decision                                  |
//! |-----------------------------|-------------------------------------------|
//! | `plan`, recipe              | prompt, then `execute_recipe` or end      |
//! | `plan`, single step         | `execute_single_action`, no prompt        |
//! | `request_approval`          | prompt, then `user_approval_response`     |
//! | `error`, `unsafe`           | end (failure)                             |
//! | `final_summary`             | end (success)                             |
//! | `deny_current_action`       | end                                       |
//!
//! Commands are only written after the triggering message has been fully
//! handled, and never while another read is pending.

use std::fmt;

use tracing::{debug, warn};

use super::lines::AgentLines;
use super::process::CommandSink;
use super::protocol::{decode_line, CommandMessage, DecodedLine, ProtocolMessage};
use crate::config::Verbosity;
use crate::error::ProcessError;
use crate::tui::{Console, Notice};

/// Question asked before running a multi-step recipe.
pub const RECIPE_PROMPT: &str = "Proceed with recipe?";

/// Question asked before running a single step.
pub const STEP_PROMPT: &str = "Execute step?";

/// How a session's message loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The agent sent its final summary.
    Completed,
    /// The agent reported an error.
    AgentError,
    /// The auditor rejected an action.
    Unsafe,
    /// The user declined the recipe.
    RecipeDenied,
    /// The agent ended the session after handling a denial itself.
    ActionDenied,
    /// Stdout closed without a terminal message.
    StreamClosed,
}

impl SessionOutcome {
    /// Whether the agent signalled a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::AgentError | Self::Unsafe)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_failure() {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::AgentError => "agent error",
            Self::Unsafe => "unsafe action rejected",
            Self::RecipeDenied => "recipe denied",
            Self::ActionDenied => "action denied",
            Self::StreamClosed => "agent output closed",
        };
        f.write_str(s)
    }
}

/// What the loop does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done(SessionOutcome),
}

/// Drives one session's message loop.
pub struct MessageProcessor<'a> {
    sink: &'a dyn CommandSink,
    console: &'a dyn Console,
    verbosity: Verbosity,
}

impl<'a> MessageProcessor<'a> {
    pub fn new(sink: &'a dyn CommandSink, console: &'a dyn Console, verbosity: Verbosity) -> Self {
        Self {
            sink,
            console,
            verbosity,
        }
    }

    /// Process lines until a terminal message or end of stream.
    ///
    /// Only read failures (including oversized lines) and command write
    /// failures are errors; everything the agent says ends in an outcome.
    pub async fn run(&self, lines: &mut AgentLines) -> Result<SessionOutcome, ProcessError> {
        while let Some(line) = lines.next_line().await? {
            if let Flow::Done(outcome) = self.process_line(&line).await? {
                debug!(%outcome, "Message loop finished");
                return Ok(outcome);
            }
        }

        debug!("Agent stdout closed without a terminal message");
        Ok(SessionOutcome::StreamClosed)
    }

    /// Decode and handle a single stdout line.
    pub async fn process_line(&self, line: &str) -> Result<Flow, ProcessError> {
        match decode_line(line) {
            DecodedLine::Blank => Ok(Flow::Continue),
            DecodedLine::Passthrough(text) => {
                debug!(line = %text, "Non-protocol agent output");
                if self.verbosity.is_debug() {
                    self.console.raw_line(&text);
                }
                Ok(Flow::Continue)
            }
            DecodedLine::Message(message) => self.handle_message(&message).await,
        }
    }

    /// Render a message and act on it.
    pub async fn handle_message(&self, message: &ProtocolMessage) -> Result<Flow, ProcessError> {
        debug!(kind = message.type_name(), "Agent message");
        self.console.agent_message(message, self.verbosity);

        let flow = match message {
            ProtocolMessage::Error { .. } => Flow::Done(SessionOutcome::AgentError),
            ProtocolMessage::Unsafe { .. } => Flow::Done(SessionOutcome::Unsafe),
            ProtocolMessage::FinalSummary { .. } => Flow::Done(SessionOutcome::Completed),
            ProtocolMessage::DenyCurrentAction => Flow::Done(SessionOutcome::ActionDenied),

            ProtocolMessage::Plan(plan) if plan.is_recipe() => {
                if self.console.confirm(RECIPE_PROMPT).await {
                    self.send(&CommandMessage::ExecuteRecipe).await?;
                    Flow::Continue
                } else {
                    self.console
                        .notice(Notice::Warning, "🚫 Recipe denied by user. Session ending.");
                    Flow::Done(SessionOutcome::RecipeDenied)
                }
            }
            ProtocolMessage::Plan(_) => {
                self.send(&CommandMessage::ExecuteSingleAction).await?;
                Flow::Continue
            }

            ProtocolMessage::RequestApproval(_) => {
                let approved = self.console.confirm(STEP_PROMPT).await;
                self.send(&CommandMessage::UserApprovalResponse { approved })
                    .await?;
                Flow::Continue
            }

            ProtocolMessage::Log(_)
            | ProtocolMessage::DebugLog(_)
            | ProtocolMessage::InfoLog(_)
            | ProtocolMessage::WarnLog(_)
            | ProtocolMessage::Result(_)
            | ProtocolMessage::Unrecognized { .. } => Flow::Continue,
        };

        Ok(flow)
    }

    async fn send(&self, command: &CommandMessage) -> Result<(), ProcessError> {
        self.sink.send_command(command).await.map_err(|e| {
            warn!("Failed to send command to agent: {e}");
            e
        })
    }
}
