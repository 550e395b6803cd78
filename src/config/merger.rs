// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles resolving the file configuration against built-in defaults and
//! CLI overrides, including the per-role fallback to the default agent.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::loader::{expand_home, DATA_DIR};
use super::types::{FileConfig, ModelConfig, ModelParams, ResolvedConfig, ResolvedModel, Verbosity};

/// Model used when neither the role nor the default agent names one.
pub const FALLBACK_MODEL: &str = "ollama/llama3:latest";

/// Output threshold applied when the config omits it or sets it to zero.
pub const DEFAULT_OUTPUT_THRESHOLD_BYTES: u64 = 131_072;

/// Session timeout reported when the config omits it.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u32 = 30;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub verbosity: Option<Verbosity>,
    pub agent_path: Option<PathBuf>,
    pub summary_mode: Option<bool>,
}

/// Merge the file configuration with CLI options.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Config file
/// 3. Default values
pub fn merge_config(file: FileConfig, cli: CliOptions, data_dir: &Path) -> ResolvedConfig {
    let default_agent = file.default_agent.unwrap_or_default();
    let general = file.general.unwrap_or_default();
    let cache = file.cache.unwrap_or_default();

    let verbosity = match general.verbosity_level.as_deref() {
        Some(level) => level.parse().unwrap_or_else(|e| {
            warn!("{e}. Defaulting verbosity to 'info'.");
            Verbosity::Info
        }),
        None => Verbosity::Info,
    };

    let agent_path = general
        .python_agent_path
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(|| data_dir.join("agent.py"));

    let output_threshold_bytes = match general.output_threshold_bytes {
        Some(0) | None => DEFAULT_OUTPUT_THRESHOLD_BYTES,
        Some(bytes) => bytes,
    };

    let mut result = ResolvedConfig {
        executor: resolve_model(file.executor_agent.as_ref(), &default_agent),
        planner: resolve_model(file.planner_agent.as_ref(), &default_agent),
        auditor: resolve_model(file.auditor_agent.as_ref(), &default_agent),
        agent_path,
        summary_mode: general.summary_mode.unwrap_or(false),
        verbosity,
        session_timeout_minutes: general
            .session_timeout_minutes
            .unwrap_or(DEFAULT_SESSION_TIMEOUT_MINUTES),
        output_threshold_bytes,
        json_logs: cache.json_logs.unwrap_or(true),
        cache_dir: resolve_cache_dir(cache.directory.as_deref(), data_dir),
        cache_expiration_days: cache.expiration.unwrap_or(0),
        data_dir: data_dir.to_path_buf(),
        scratch_root: std::env::temp_dir(),
    };

    apply_cli_options(&mut result, &cli);
    result
}

/// Resolve with no config file at all, e.g. for `og --show-config` before `og init`.
pub fn default_config(data_dir: &Path) -> ResolvedConfig {
    merge_config(FileConfig::default(), CliOptions::default(), data_dir)
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if let Some(verbosity) = cli.verbosity {
        result.verbosity = verbosity;
    }

    if let Some(ref path) = cli.agent_path {
        result.agent_path = path.clone();
    }

    if let Some(summary_mode) = cli.summary_mode {
        result.summary_mode = summary_mode;
    }
}

/// Fill a role from the default agent.
///
/// A role without a model inherits the default model. Params start from the
/// default agent's params and are overlaid by the role's own, key by key.
pub fn resolve_model(role: Option<&ModelConfig>, defaults: &ModelConfig) -> ResolvedModel {
    let model = role
        .and_then(|r| r.model.clone())
        .filter(|m| !m.is_empty())
        .or_else(|| defaults.model.clone().filter(|m| !m.is_empty()))
        .unwrap_or_else(|| FALLBACK_MODEL.to_string());

    let mut params: ModelParams = defaults.model_params.clone().unwrap_or_default();
    if let Some(overrides) = role.and_then(|r| r.model_params.as_ref()) {
        for (key, value) in overrides {
            params.insert(key.clone(), value.clone());
        }
    }

    ResolvedModel { model, params }
}

/// The cache directory is relative to the data directory; empty means the
/// data directory itself.
fn resolve_cache_dir(directory: Option<&str>, data_dir: &Path) -> PathBuf {
    match directory {
        Some(dir) if !dir.is_empty() => {
            // `Path::join` keeps absolute (and home-expanded) paths as-is.
            data_dir.join(expand_home(dir))
        }
        _ => data_dir.to_path_buf(),
    }
}

/// Default data directory, falling back to a relative path when the home
/// directory cannot be determined.
pub fn default_data_dir() -> PathBuf {
    super::loader::get_data_dir().unwrap_or_else(|| PathBuf::from(DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{CacheConfig, GeneralConfig};

    fn params(pairs: &[(&str, serde_json::Value)]) -> ModelParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_role_inherits_default_model_and_params() {
        let defaults = ModelConfig {
            model: Some("ollama/gemma3".to_string()),
            model_params: Some(params(&[("base_url", serde_json::json!("http://localhost:11434"))])),
        };

        let resolved = resolve_model(None, &defaults);
        assert_eq!(resolved.model, "ollama/gemma3");
        assert_eq!(resolved.params["base_url"], serde_json::json!("http://localhost:11434"));
    }

    #[test]
    fn test_role_params_overlay_defaults() {
        let defaults = ModelConfig {
            model: Some("ollama/gemma3".to_string()),
            model_params: Some(params(&[
                ("base_url", serde_json::json!("http://localhost:11434")),
                ("temperature", serde_json::json!(0.7)),
            ])),
        };
        let auditor = ModelConfig {
            model: None,
            model_params: Some(params(&[("temperature", serde_json::json!(0.2))])),
        };

        let resolved = resolve_model(Some(&auditor), &defaults);
        assert_eq!(resolved.model, "ollama/gemma3");
        assert_eq!(resolved.params["temperature"], serde_json::json!(0.2));
        assert_eq!(resolved.params["base_url"], serde_json::json!("http://localhost:11434"));
    }

    #[test]
    fn test_role_model_wins() {
        let defaults = ModelConfig {
            model: Some("ollama/gemma3".to_string()),
            model_params: None,
        };
        let planner = ModelConfig {
            model: Some("openai/gpt-4o".to_string()),
            model_params: None,
        };

        let resolved = resolve_model(Some(&planner), &defaults);
        assert_eq!(resolved.model, "openai/gpt-4o");
        assert!(resolved.params.is_empty());
    }

    #[test]
    fn test_missing_models_use_fallback() {
        let resolved = resolve_model(None, &ModelConfig::default());
        assert_eq!(resolved.model, FALLBACK_MODEL);
    }

    #[test]
    fn test_merge_defaults() {
        let data_dir = Path::new("/home/user/.local/share/og");
        let config = default_config(data_dir);

        assert_eq!(config.verbosity, Verbosity::Info);
        assert_eq!(config.output_threshold_bytes, DEFAULT_OUTPUT_THRESHOLD_BYTES);
        assert_eq!(config.cache_dir, data_dir);
        assert_eq!(config.cache_expiration_days, 0);
        assert!(config.json_logs);
        assert!(!config.summary_mode);
        assert_eq!(config.agent_path, data_dir.join("agent.py"));
    }

    #[test]
    fn test_zero_output_threshold_uses_default() {
        let file = FileConfig {
            general: Some(GeneralConfig {
                output_threshold_bytes: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = merge_config(file, CliOptions::default(), Path::new("/data"));
        assert_eq!(config.output_threshold_bytes, DEFAULT_OUTPUT_THRESHOLD_BYTES);
    }

    #[test]
    fn test_invalid_verbosity_defaults_to_info() {
        let file = FileConfig {
            general: Some(GeneralConfig {
                verbosity_level: Some("chatty".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = merge_config(file, CliOptions::default(), Path::new("/data"));
        assert_eq!(config.verbosity, Verbosity::Info);
    }

    #[test]
    fn test_cache_directory_is_relative_to_data_dir() {
        let file = FileConfig {
            cache: Some(CacheConfig {
                directory: Some("sessions".to_string()),
                expiration: Some(14),
                json_logs: Some(false),
            }),
            ..Default::default()
        };
        let config = merge_config(file, CliOptions::default(), Path::new("/data/og"));
        assert_eq!(config.cache_dir, PathBuf::from("/data/og/sessions"));
        assert_eq!(config.cache_expiration_days, 14);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig {
            general: Some(GeneralConfig {
                verbosity_level: Some("warn".to_string()),
                summary_mode: Some(true),
                python_agent_path: Some("/opt/og/agent.py".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cli = CliOptions {
            verbosity: Some(Verbosity::Debug),
            agent_path: Some(PathBuf::from("/tmp/fake_agent.sh")),
            summary_mode: Some(false),
        };

        let config = merge_config(file, cli, Path::new("/data"));
        assert_eq!(config.verbosity, Verbosity::Debug); // CLI wins
        assert_eq!(config.agent_path, PathBuf::from("/tmp/fake_agent.sh"));
        assert!(!config.summary_mode);
    }
}
