// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session orchestration.
//!
//! A session is one CLI invocation: it derives a session hash, appends a
//! history record, sweeps expired cache files, starts the agent, runs the
//! message loop to a terminal state, and tears everything down.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Session                             │
//! │  (hash, history, cache sweep, scratch dir, shutdown)        │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │ ProcessManager  │ │MessageProcessor │ │    Console      │
//! │ (agent process) │ │ (approval loop) │ │  (rendering)    │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use og::session::Session;
//! use og::tui::TerminalConsole;
//!
//! let session = Session::new(config, Arc::new(TerminalConsole::new()));
//! let report = session.run("list the largest files here").await?;
//! std::process::exit(report.exit_code());
//! ```

mod cache;
mod controller;
mod history;
mod scratch;

pub use cache::{sweep_expired, SweepReport};
pub use controller::{Session, SessionReport, SESSION_ENDED};
pub use history::{append_record, generate_session_hash, HistoryRecord, SESSION_HASH_LEN};
pub use scratch::ScratchDir;
