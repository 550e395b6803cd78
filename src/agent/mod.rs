// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent subprocess and protocol.
//!
//! The agent is an external process that plans and executes the user's
//! request. OG starts it, reads newline-delimited JSON from its stdout,
//! asks the human whenever the agent wants to act, and writes the decision
//! back to its stdin.
//!
//! # Example
//!
//! ```rust,ignore
//! use og::agent::{MessageProcessor, ProcessManager, StartParams};
//! use og::tui::TerminalConsole;
//!
//! let manager = ProcessManager::new();
//! manager.start(&StartParams::from_config(&config, hash, query, cwd)).await?;
//!
//! let mut lines = manager.take_stdout_lines().await?;
//! let console = TerminalConsole::new();
//! let outcome = MessageProcessor::new(&manager, &console, config.verbosity)
//!     .run(&mut lines)
//!     .await;
//!
//! manager.stop().await;
//! ```

mod invocation;
mod lines;
mod process;
mod processor;
mod protocol;

pub use invocation::{AgentInvocation, StartParams, PYTHON};
pub use lines::{AgentLines, MAX_LINE_BYTES};
pub use process::{CommandSink, ProcessManager, StopOutcome, DEFAULT_STOP_GRACE};
pub use processor::{Flow, MessageProcessor, SessionOutcome, RECIPE_PROMPT, STEP_PROMPT};
pub use protocol::{
    decode_line, CommandMessage, DecodedLine, LogPayload, PlanPayload, ProtocolMessage,
    RecipeStep, ResultPayload, ResultStatus,
};

