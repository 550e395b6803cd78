// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for OG.
//!
//! Handles loading and merging configuration from:
//! - The config file: `~/.local/share/og/og_config.toml` (YAML and JSON also accepted)
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > config file > defaults).
//! Roles without their own model inherit from `default_agent`.

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{
    expand_home, find_config_file, get_data_dir, get_default_config, init_config,
    load_config_file, load_file_config, CONFIG_FILES, DATA_DIR, HISTORY_FILE,
};

pub use merger::{
    default_config, default_data_dir, merge_config, resolve_model, CliOptions,
    DEFAULT_OUTPUT_THRESHOLD_BYTES, DEFAULT_SESSION_TIMEOUT_MINUTES, FALLBACK_MODEL,
};

pub use types::{
    CacheConfig, FileConfig, GeneralConfig, ModelConfig, ModelParams, ResolvedConfig,
    ResolvedModel, Verbosity,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge configuration for a session.
///
/// This is the main entry point for configuration loading. A missing config
/// file is an error; run `og init` to create one.
pub fn load_config(cli_options: CliOptions) -> Result<ResolvedConfig, ConfigError> {
    let data_dir = get_data_dir().ok_or(ConfigError::NoHomeDir)?;
    load_config_from(&data_dir, cli_options)
}

/// Load and merge configuration from an explicit data directory.
pub fn load_config_from(
    data_dir: &Path,
    cli_options: CliOptions,
) -> Result<ResolvedConfig, ConfigError> {
    let file = load_file_config(data_dir)?;
    Ok(merge_config(file, cli_options, data_dir))
}
