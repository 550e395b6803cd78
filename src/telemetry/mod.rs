// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracing setup for the OG front-end.
//!
//! Diagnostics are written to stderr through `tracing-subscriber` so they
//! never interleave with the console output rendered from agent messages.
//!
//! # Usage
//!
//! ```rust,ignore
//! use og::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::for_verbosity(config.verbosity))?;
//! ```
//!
//! Session work runs inside a `session` span carrying the session hash, so
//! every protocol `debug!` line can be correlated with its invocation.

mod init;

pub use init::{bootstrap_subscriber, init_telemetry, level_for_verbosity, TelemetryConfig, TelemetryGuard};
