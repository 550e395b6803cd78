// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles locating the data directory and loading the configuration file
//! in TOML, YAML, or JSON form.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::{CacheConfig, FileConfig, GeneralConfig, ModelConfig, ModelParams};

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    "og_config.toml",
    "og_config.yaml",
    "og_config.yml",
    "og_config.json",
];

/// Data directory, relative to the home directory.
pub const DATA_DIR: &str = ".local/share/og";

/// History file name inside the data directory.
pub const HISTORY_FILE: &str = "history.json";

/// Get the data directory path (`~/.local/share/og`).
pub fn get_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR))
}

/// Find the first existing config file in `data_dir`.
pub fn find_config_file(data_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| data_dir.join(name))
        .find(|path| path.exists())
}

/// Load the configuration file from the data directory.
///
/// Returns [`ConfigError::NotFound`] when no config file exists, so the
/// caller can point the user at `og init`.
pub fn load_file_config(data_dir: &Path) -> Result<FileConfig, ConfigError> {
    let path = find_config_file(data_dir).ok_or_else(|| {
        ConfigError::NotFound(data_dir.join(CONFIG_FILES[0]).display().to_string())
    })?;
    load_config_file(&path)
}

/// Load a configuration file (TOML, YAML, or JSON).
pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        "json" => serde_json::from_str(&content).map_err(ConfigError::from),
        "toml" | "" => toml::from_str(&content).map_err(ConfigError::from),
        other => Err(ConfigError::InvalidFormat(format!(
            "unsupported config extension '.{other}'"
        ))),
    }
}

/// Write the default configuration to `<data_dir>/og_config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(data_dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = data_dir.join(CONFIG_FILES[0]);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.display().to_string()));
    }

    std::fs::create_dir_all(data_dir)?;
    let content = toml::to_string_pretty(&get_default_config())?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// The configuration written by `og init`.
pub fn get_default_config() -> FileConfig {
    let mut default_params = ModelParams::new();
    default_params.insert(
        "base_url".to_string(),
        serde_json::json!("http://localhost:11434"),
    );

    // The auditor runs colder than the other roles.
    let mut auditor_params = ModelParams::new();
    auditor_params.insert("temperature".to_string(), serde_json::json!(0.2));

    FileConfig {
        default_agent: Some(ModelConfig {
            model: Some("ollama/gemma3:12b-it-qat".to_string()),
            model_params: Some(default_params),
        }),
        executor_agent: None,
        planner_agent: None,
        auditor_agent: Some(ModelConfig {
            model: None,
            model_params: Some(auditor_params),
        }),
        general: Some(GeneralConfig {
            python_agent_path: Some(format!("~/{DATA_DIR}/agent.py")),
            summary_mode: Some(true),
            verbosity_level: Some("info".to_string()),
            session_timeout_minutes: Some(30),
            output_threshold_bytes: Some(4096),
        }),
        cache: Some(CacheConfig {
            json_logs: Some(true),
            directory: Some(String::new()),
            expiration: Some(0),
        }),
    }
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
