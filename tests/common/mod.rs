// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared fixtures: shell-script agents and a capturing console.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use og::agent::ProtocolMessage;
use og::config::{default_config, ResolvedConfig, Verbosity};
use og::tui::{Console, Notice};
use tempfile::TempDir;

/// Everything the console was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Message(ProtocolMessage),
    Raw(String),
    Stderr(String),
    Notice(Notice, String),
    Prompt(String),
}

/// Console that records output and answers prompts from a script.
#[derive(Default)]
pub struct RecordingConsole {
    answers: Mutex<VecDeque<bool>>,
    shown: Mutex<Vec<Shown>>,
}

impl RecordingConsole {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<ProtocolMessage> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Prompt(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn raw_lines(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Raw(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    fn push(&self, shown: Shown) {
        self.shown.lock().unwrap().push(shown);
    }
}

#[async_trait]
impl Console for RecordingConsole {
    fn agent_message(&self, message: &ProtocolMessage, _verbosity: Verbosity) {
        self.push(Shown::Message(message.clone()));
    }

    fn raw_line(&self, line: &str) {
        self.push(Shown::Raw(line.to_string()));
    }

    fn agent_stderr(&self, line: &str) {
        self.push(Shown::Stderr(line.to_string()));
    }

    fn notice(&self, kind: Notice, text: &str) {
        self.push(Shown::Notice(kind, text.to_string()));
    }

    async fn confirm(&self, question: &str) -> bool {
        self.push(Shown::Prompt(question.to_string()));
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}

/// Temporary data dir, working dir and scratch root with a script agent.
pub struct AgentFixture {
    pub temp: TempDir,
    pub config: ResolvedConfig,
    pub workdir: PathBuf,
}

impl AgentFixture {
    /// Build a fixture whose agent runs `body` under `/bin/sh`.
    ///
    /// `$2` in the script is the session hash.
    pub fn new(body: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let agent = temp.path().join("fake_agent.sh");
        write_script(&agent, body);

        let workdir = temp.path().join("work");
        std::fs::create_dir_all(&workdir).unwrap();

        let mut config = default_config(&temp.path().join("data"));
        config.agent_path = agent;
        config.scratch_root = temp.path().join("scratch");
        config.verbosity = Verbosity::Info;

        Self {
            temp,
            config,
            workdir,
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// A path inside the fixture for the agent to write to.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }
}

pub fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
