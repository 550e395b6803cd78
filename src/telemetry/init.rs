// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry initialization and configuration.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::Verbosity;

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Default log level if RUST_LOG is not set.
    pub default_level: Level,

    /// Whether to include span events (enter/exit).
    pub include_span_events: bool,

    /// Whether to include target module path.
    pub include_target: bool,

    /// Whether to use ANSI colors in output.
    pub ansi_colors: bool,

    /// Custom filter directive (overrides default_level).
    pub filter_directive: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            include_span_events: false,
            include_target: false,
            ansi_colors: true,
            filter_directive: None,
        }
    }
}

impl TelemetryConfig {
    /// Config whose default level follows the session verbosity.
    ///
    /// Debug verbosity also turns on targets and span close events so the
    /// process lifecycle is visible.
    pub fn for_verbosity(verbosity: Verbosity) -> Self {
        let debug = verbosity.is_debug();
        Self {
            default_level: level_for_verbosity(verbosity),
            include_span_events: debug,
            include_target: debug,
            ..Self::default()
        }
    }

    /// Set the default log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_directive = Some(filter.into());
        self
    }

    /// Enable or disable ANSI colors.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    fn build_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_level.to_string());
        match &self.filter_directive {
            Some(directive) => EnvFilter::try_new(directive).unwrap_or_else(|_| fallback()),
            // RUST_LOG takes precedence over the verbosity-derived level
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Map a verbosity threshold to a tracing level.
pub fn level_for_verbosity(verbosity: Verbosity) -> Level {
    match verbosity {
        Verbosity::Debug => Level::DEBUG,
        Verbosity::Info => Level::INFO,
        Verbosity::Warn => Level::WARN,
        Verbosity::None => Level::ERROR,
    }
}

/// Keep this guard alive for the duration of the program.
pub struct TelemetryGuard {
    _private: (),
}

/// Warn-level stderr subscriber for the window before the configured
/// verbosity is known, e.g. while the config file is being read.
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync + 'static {
    fmt::fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::WARN)
        .with_target(false)
        .compact()
        .finish()
}

/// Initialize telemetry with the given configuration.
///
/// Call once at startup. A second call fails because a global subscriber
/// is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> io::Result<TelemetryGuard> {
    let span_events = if config.include_span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .with_span_events(span_events)
        .compact();

    tracing_subscriber::registry()
        .with(config.build_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(TelemetryGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.default_level, Level::WARN);
        assert!(config.ansi_colors);
        assert!(!config.include_span_events);
    }

    #[test]
    fn test_level_follows_verbosity() {
        assert_eq!(level_for_verbosity(Verbosity::Debug), Level::DEBUG);
        assert_eq!(level_for_verbosity(Verbosity::Info), Level::INFO);
        assert_eq!(level_for_verbosity(Verbosity::Warn), Level::WARN);
        assert_eq!(level_for_verbosity(Verbosity::None), Level::ERROR);
    }

    #[test]
    fn test_debug_verbosity_enables_span_events() {
        let config = TelemetryConfig::for_verbosity(Verbosity::Debug);
        assert!(config.include_span_events);
        assert!(config.include_target);

        let config = TelemetryConfig::for_verbosity(Verbosity::Warn);
        assert!(!config.include_span_events);
    }

    #[test]
    fn test_telemetry_config_builder() {
        let config = TelemetryConfig::default()
            .with_level(Level::DEBUG)
            .with_filter("og=trace")
            .with_ansi(false);

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.filter_directive, Some("og=trace".to_string()));
        assert!(!config.ansi_colors);
    }
}
