// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent command-line construction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::{ResolvedConfig, ResolvedModel, Verbosity};
use crate::error::ProcessError;

/// Interpreter used for Python agents.
pub const PYTHON: &str = "python3";

/// Everything needed to launch one agent for one session.
#[derive(Debug, Clone)]
pub struct StartParams {
    pub agent_path: PathBuf,
    pub session_hash: String,
    pub query: String,
    /// Caller's working directory; also the agent's
    pub workdir: PathBuf,
    pub executor: ResolvedModel,
    pub planner: ResolvedModel,
    pub auditor: ResolvedModel,
    pub output_threshold_bytes: u64,
    pub verbosity: Verbosity,
    pub summary_mode: bool,
    pub json_logs: bool,
    pub cache_dir: PathBuf,
}

impl StartParams {
    /// Take the role and output settings from a resolved config.
    pub fn from_config(
        config: &ResolvedConfig,
        session_hash: impl Into<String>,
        query: impl Into<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            agent_path: config.agent_path.clone(),
            session_hash: session_hash.into(),
            query: query.into(),
            workdir: workdir.into(),
            executor: config.executor.clone(),
            planner: config.planner.clone(),
            auditor: config.auditor.clone(),
            output_threshold_bytes: config.output_threshold_bytes,
            verbosity: config.verbosity,
            summary_mode: config.summary_mode,
            json_logs: config.json_logs,
            cache_dir: config.cache_dir.clone(),
        }
    }
}

/// A fully built agent command: program, arguments and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(String, OsString)>,
    pub current_dir: PathBuf,
}

impl AgentInvocation {
    /// Build the invocation, reading `PYTHONPATH` from the environment.
    pub fn build(params: &StartParams) -> Result<Self, ProcessError> {
        Self::build_with_pythonpath(params, std::env::var_os("PYTHONPATH"))
    }

    /// Build the invocation against an explicit existing `PYTHONPATH`.
    ///
    /// A `.py` agent runs as `python3 -m <package>.<module>`, with the
    /// package's parent appended to `PYTHONPATH`. Anything else is executed
    /// directly.
    pub fn build_with_pythonpath(
        params: &StartParams,
        existing_pythonpath: Option<OsString>,
    ) -> Result<Self, ProcessError> {
        let path = &params.agent_path;
        let is_python = path.extension().and_then(|e| e.to_str()) == Some("py");

        let (program, mut args, env) = if is_python {
            let (module, package_root) = python_module(path)?;
            let pythonpath = extend_pythonpath(existing_pythonpath, &package_root)?;
            (
                OsString::from(PYTHON),
                vec![OsString::from("-m"), OsString::from(module)],
                vec![("PYTHONPATH".to_string(), pythonpath)],
            )
        } else {
            (path.as_os_str().to_os_string(), Vec::new(), Vec::new())
        };

        args.extend(agent_flags(params).into_iter().map(OsString::from));

        Ok(Self {
            program,
            args,
            env,
            current_dir: params.workdir.clone(),
        })
    }
}

/// `<package>.<module>` plus the directory that contains the package.
fn python_module(path: &Path) -> Result<(String, PathBuf), ProcessError> {
    let module = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty());
    let package_dir = path.parent();
    let package = package_dir
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str());

    match (module, package, package_dir.and_then(Path::parent)) {
        (Some(module), Some(package), Some(root)) => Ok((format!("{package}.{module}"), root.to_path_buf())),
        _ => Err(ProcessError::Start(format!(
            "cannot derive a Python module from agent path {}",
            path.display()
        ))),
    }
}

fn extend_pythonpath(existing: Option<OsString>, root: &Path) -> Result<OsString, ProcessError> {
    let mut entries: Vec<PathBuf> = existing
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| std::env::split_paths(v).collect())
        .unwrap_or_default();
    entries.push(root.to_path_buf());

    std::env::join_paths(entries).map_err(|e| ProcessError::Start(format!("invalid PYTHONPATH: {e}")))
}

/// Agent flags, in the order the agent's argument parser documents them.
fn agent_flags(params: &StartParams) -> Vec<String> {
    let mut flags = vec![
        "--session-hash".to_string(),
        params.session_hash.clone(),
        "--query".to_string(),
        params.query.clone(),
        "--workdir".to_string(),
        params.workdir.display().to_string(),
    ];

    for (role, model) in [
        ("executor", &params.executor),
        ("planner", &params.planner),
        ("auditor", &params.auditor),
    ] {
        flags.push(format!("--{role}-model"));
        flags.push(model.model.clone());
        flags.push(format!("--{role}-params"));
        flags.push(model.params_json());
    }

    flags.extend([
        "--output-threshold-bytes".to_string(),
        params.output_threshold_bytes.to_string(),
        "--json-logs-enabled".to_string(),
        params.json_logs.to_string(),
        "--cache-directory".to_string(),
        params.cache_dir.display().to_string(),
        "--verbosity".to_string(),
        params.verbosity.to_string(),
    ]);

    if params.summary_mode {
        flags.push("--summary-mode".to_string());
    }

    flags
}
