// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of the on-disk configuration file and of the
//! resolved configuration handed to a session. The file format is TOML by
//! default; YAML and JSON are accepted with the same keys.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Free-form model parameters forwarded to the agent as a JSON object.
pub type ModelParams = BTreeMap<String, serde_json::Value>;

/// Configuration file contents. Every field is optional; missing values
/// fall back to the default agent or to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Model shared by every role unless overridden
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<ModelConfig>,

    /// Model that carries out approved actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_agent: Option<ModelConfig>,

    /// Model that drafts the recipe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner_agent: Option<ModelConfig>,

    /// Model that vets requests and actions for safety
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auditor_agent: Option<ModelConfig>,

    /// General settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralConfig>,

    /// Session log cache settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
}

/// Model identifier plus provider-specific parameters for one agent role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_params: Option<ModelParams>,
}

/// `[general]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path to the agent entry point (`.py` files run as a module)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_agent_path: Option<String>,

    /// Ask the agent for a condensed final summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_mode: Option<bool>,

    /// debug, info, warn or none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity_level: Option<String>,

    /// Accepted and reported, but not enforced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timeout_minutes: Option<u32>,

    /// Tool output above this size is spilled to a file by the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_threshold_bytes: Option<u64>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the agent writes structured session logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_logs: Option<bool>,

    /// Relative to the data directory; empty means the data directory itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Days before cached session files are swept; 0 disables the sweep
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u32>,
}

/// Verbosity threshold shared by the front-end and the agent.
///
/// Ordered from most to least chatty: `Debug < Info < Warn < None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Debug,
    #[default]
    Info,
    Warn,
    None,
}

impl Verbosity {
    /// Token passed on the agent command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::None => "none",
        }
    }

    /// Whether a message at `level` should be shown under this threshold.
    pub fn allows(&self, level: Verbosity) -> bool {
        *self != Verbosity::None && level >= *self
    }

    /// Whether non-protocol diagnostics should be shown.
    pub fn is_debug(&self) -> bool {
        *self == Verbosity::Debug
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "none" | "off" => Ok(Self::None),
            other => Err(ConfigError::InvalidValue {
                field: "verbosity_level".to_string(),
                message: format!("unknown level '{other}' (expected debug, info, warn or none)"),
            }),
        }
    }
}

/// A fully resolved agent role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModel {
    pub model: String,
    pub params: ModelParams,
}

impl ResolvedModel {
    /// Parameters as a compact JSON object string.
    pub fn params_json(&self) -> String {
        serde_json::to_string(&self.params).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Resolved configuration with all values set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub executor: ResolvedModel,
    pub planner: ResolvedModel,
    pub auditor: ResolvedModel,
    pub agent_path: PathBuf,
    pub summary_mode: bool,
    pub verbosity: Verbosity,
    pub session_timeout_minutes: u32,
    pub output_threshold_bytes: u64,
    pub json_logs: bool,
    pub cache_dir: PathBuf,
    pub cache_expiration_days: u32,
    /// Base directory holding the config and history files
    pub data_dir: PathBuf,
    /// Root under which per-session scratch directories are created
    pub scratch_root: PathBuf,
}
