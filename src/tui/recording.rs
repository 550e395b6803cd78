// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Capturing console for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::console::{Console, Notice};
use crate::agent::ProtocolMessage;
use crate::config::Verbosity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Message(ProtocolMessage),
    Raw(String),
    Stderr(String),
    Notice(Notice, String),
    Prompt(String),
}

/// Records everything shown and answers prompts from a script.
/// Prompts past the end of the script are answered "no".
#[derive(Debug, Default)]
pub struct RecordingConsole {
    answers: Mutex<VecDeque<bool>>,
    events: Mutex<Vec<ConsoleEvent>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Prompt(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    pub fn raw_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Raw(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ConsoleEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Console for RecordingConsole {
    fn agent_message(&self, message: &ProtocolMessage, _verbosity: Verbosity) {
        self.push(ConsoleEvent::Message(message.clone()));
    }

    fn raw_line(&self, line: &str) {
        self.push(ConsoleEvent::Raw(line.to_string()));
    }

    fn agent_stderr(&self, line: &str) {
        self.push(ConsoleEvent::Stderr(line.to_string()));
    }

    fn notice(&self, kind: Notice, text: &str) {
        self.push(ConsoleEvent::Notice(kind, text.to_string()));
    }

    async fn confirm(&self, question: &str) -> bool {
        self.push(ConsoleEvent::Prompt(question.to_string()));
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}
