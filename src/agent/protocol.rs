// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wire types for the agent protocol.
//!
//! The agent and the front-end exchange newline-delimited JSON over the
//! agent's stdin/stdout. Every object carries a `type` tag. Messages flow
//! agent → front-end as [`ProtocolMessage`]; decisions flow back as
//! [`CommandMessage`].
//!
//! Decoding never fails: anything that is not a recognizable protocol
//! object degrades to [`DecodedLine::Passthrough`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::Verbosity;

/// Tags the front-end knows how to decode into a [`ProtocolMessage`] variant.
const KNOWN_TYPES: &[&str] = &[
    "log",
    "debug_log",
    "info_log",
    "warn_log",
    "error",
    "unsafe",
    "plan",
    "request_approval",
    "result",
    "final_summary",
    "deny_current_action",
];

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A log line emitted by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Source location inside the agent, shown at debug verbosity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// One proposed action: what it does, the concrete action, and the tool that runs it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStep {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool: String,
}

/// A plan proposed for the user's request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub request: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipe_steps: Vec<RecipeStep>,
    #[serde(default)]
    pub fallback_action: Option<RecipeStep>,
}

impl PlanPayload {
    /// Whether the plan is a recipe needing plan-level approval.
    ///
    /// Two or more steps, or any fallback, make it a recipe. A single bare
    /// step (or none at all) goes straight to per-step approval.
    pub fn is_recipe(&self) -> bool {
        self.recipe_steps.len() >= 2 || self.fallback_action.is_some()
    }
}

/// Outcome of an executed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Failure,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Output of an executed step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ResultStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interpret_message: String,
}

/// A message from the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    Log(LogPayload),
    DebugLog(LogPayload),
    InfoLog(LogPayload),
    WarnLog(LogPayload),
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Unsafe {
        #[serde(default, deserialize_with = "null_as_default")]
        reason: String,
        #[serde(default, deserialize_with = "null_as_default")]
        explanation: String,
    },
    Plan(PlanPayload),
    RequestApproval(RecipeStep),
    Result(ResultPayload),
    FinalSummary {
        #[serde(default, deserialize_with = "null_as_default")]
        summary: String,
        #[serde(default, deserialize_with = "null_as_default")]
        nutshell: String,
    },
    DenyCurrentAction,
    /// A JSON object whose tag the front-end does not know.
    #[serde(skip)]
    Unrecognized {
        tag: String,
        message: Option<String>,
    },
}

impl ProtocolMessage {
    /// The wire tag for this message.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Log(_) => "log",
            Self::DebugLog(_) => "debug_log",
            Self::InfoLog(_) => "info_log",
            Self::WarnLog(_) => "warn_log",
            Self::Error { .. } => "error",
            Self::Unsafe { .. } => "unsafe",
            Self::Plan(_) => "plan",
            Self::RequestApproval(_) => "request_approval",
            Self::Result(_) => "result",
            Self::FinalSummary { .. } => "final_summary",
            Self::DenyCurrentAction => "deny_current_action",
            Self::Unrecognized { tag, .. } => tag,
        }
    }

    /// Whether this message ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Error { .. } | Self::Unsafe { .. } | Self::FinalSummary { .. } | Self::DenyCurrentAction
        )
    }

    /// Verbosity level of a log message, `None` for everything else.
    ///
    /// Plain `log` counts as info.
    pub fn log_level(&self) -> Option<(Verbosity, &LogPayload)> {
        match self {
            Self::Log(p) | Self::InfoLog(p) => Some((Verbosity::Info, p)),
            Self::DebugLog(p) => Some((Verbosity::Debug, p)),
            Self::WarnLog(p) => Some((Verbosity::Warn, p)),
            _ => None,
        }
    }
}

/// A command written to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandMessage {
    /// Run the approved recipe.
    ExecuteRecipe,
    /// Proceed with the single proposed action; it is approved per step.
    ExecuteSingleAction,
    /// Answer to a `request_approval`.
    UserApprovalResponse { approved: bool },
}

impl CommandMessage {
    /// Serialize to a single line without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Result of decoding one stdout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLine {
    /// Empty or whitespace-only line.
    Blank,
    /// A protocol message.
    Message(ProtocolMessage),
    /// Anything outside the protocol, kept verbatim.
    Passthrough(String),
}

/// Decode one line of agent output.
///
/// A line that is not a JSON object, or a known tag whose fields have the
/// wrong types, is passthrough text. An object with an unknown or missing
/// tag becomes [`ProtocolMessage::Unrecognized`].
pub fn decode_line(line: &str) -> DecodedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return DecodedLine::Blank;
    }

    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => return DecodedLine::Passthrough(line.to_string()),
    };

    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();

    if !KNOWN_TYPES.contains(&tag.as_str()) {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        return DecodedLine::Message(ProtocolMessage::Unrecognized { tag, message });
    }

    match serde_json::from_value(value) {
        Ok(message) => DecodedLine::Message(message),
        Err(e) => {
            tracing::debug!(tag = %tag, error = %e, "Protocol object failed to decode");
            DecodedLine::Passthrough(line.to_string())
        }
    }
}
