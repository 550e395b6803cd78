// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the OG front-end.
//!
//! This module provides strongly-typed errors for different parts of the application,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation.

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Config file already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlError(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::TomlError(err.to_string())
    }
}

/// Errors that can occur while driving the agent subprocess.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// A pipe could not be established or the process image could not be launched.
    #[error("Failed to start agent: {0}")]
    Start(String),

    /// The command could not be written to the agent's stdin.
    #[error("Failed to write command to agent: {0}")]
    Write(String),

    /// An operation needed a running agent but none was started.
    #[error("Agent process not started")]
    NotStarted,

    /// The stdout line stream was already handed out.
    #[error("Agent stdout already taken")]
    StdoutTaken,

    /// Reading the agent's stdout failed.
    #[error("Failed to read agent output: {0}")]
    Read(String),

    /// The agent emitted a line over the framing limit.
    #[error("Agent output line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

impl ProcessError {
    /// Whether this error came from the command side of the protocol.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write(_) | Self::NotStarted)
    }
}

/// Errors writing the session history log.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to write history file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode history record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors that end a session with a hard failure.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to determine working directory: {0}")]
    WorkingDirectory(String),

    #[error("Failed to start agent process: {0}")]
    Start(#[source] ProcessError),

    #[error("Agent message processing failed: {0}")]
    Protocol(#[source] ProcessError),
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
