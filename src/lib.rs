// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! OG - a command-line front-end for a planning agent.
//!
//! OG hands a natural-language request to a separate agent process and
//! keeps a human in the loop: every recipe and every action the agent wants
//! to run is shown and must be approved before the agent proceeds.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Tracing setup
//! - [`agent`] - Agent subprocess, wire protocol, and the approval state machine
//! - [`session`] - Session lifecycle: history, cache sweep, scratch directory, shutdown
//! - [`tui`] - Console rendering and approval prompts
//!
//! # Example
//!
//! ```rust,ignore
//! use og::config::{load_config, CliOptions};
//! use og::session::Session;
//! use og::tui::TerminalConsole;
//!
//! let config = load_config(CliOptions::default())?;
//! let session = Session::new(config, Arc::new(TerminalConsole::new()));
//! let report = session.run("clean up the build artifacts").await?;
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod tui;

// Re-export commonly used types at crate root
pub use error::{ConfigError, HistoryError, ProcessError, Result, SessionError};

/// OG version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
