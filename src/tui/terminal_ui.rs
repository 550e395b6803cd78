// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Terminal rendering for agent messages.
//!
//! Plain scrolling output on stdout: no alternate screen, no raw mode.
//! Agent stderr and raw diagnostics go to stderr. Approval prompts read a
//! line from stdin on a blocking thread.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::Colorize;

use super::console::{Console, Notice};
use crate::agent::{PlanPayload, ProtocolMessage, RecipeStep, ResultStatus};
use crate::config::Verbosity;

/// Console writing to the real terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Console for TerminalConsole {
    fn agent_message(&self, message: &ProtocolMessage, verbosity: Verbosity) {
        if let Some(text) = render_message(message, verbosity) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{text}");
            let _ = stdout.flush();
        }
    }

    fn raw_line(&self, line: &str) {
        eprintln!("{line}");
    }

    fn agent_stderr(&self, line: &str) {
        eprintln!("{} {}", "[AGENT STDERR]".magenta(), line);
    }

    fn notice(&self, kind: Notice, text: &str) {
        println!("{}", render_notice(kind, text));
    }

    async fn confirm(&self, question: &str) -> bool {
        print!("\n{}\n{} [y/N]: ", question.yellow(), "Approve?".blue());
        let _ = io::stdout().flush();

        let answer = tokio::task::spawn_blocking(|| {
            let mut input = String::new();
            match io::stdin().lock().read_line(&mut input) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(input),
            }
        })
        .await
        .ok()
        .flatten();

        match answer {
            Some(input) => is_affirmative(&input),
            None => {
                // EOF on stdin: nobody can approve.
                println!();
                false
            }
        }
    }
}

/// Whether an approval answer means yes.
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Render a status line.
pub fn render_notice(kind: Notice, text: &str) -> String {
    match kind {
        Notice::Info => text.cyan().to_string(),
        Notice::Success => text.green().to_string(),
        Notice::Warning => text.yellow().to_string(),
        Notice::Error => text.red().to_string(),
    }
}

/// Render a message for display, `None` when verbosity hides it.
pub fn render_message(message: &ProtocolMessage, verbosity: Verbosity) -> Option<String> {
    if let Some((level, log)) = message.log_level() {
        if !verbosity.allows(level) {
            return None;
        }
        let mut line = format!("{} {}", "[AGENT]".magenta(), log.message);
        if verbosity.is_debug() {
            if let Some(location) = log.location.as_deref().filter(|l| !l.is_empty()) {
                line.push_str(&format!(" {}", format!("({location})").dimmed()));
            }
        }
        return Some(line);
    }

    let text = match message {
        ProtocolMessage::Error { message } => format!("{} {}", "[ERROR]".red(), message),
        ProtocolMessage::Unsafe {
            reason,
            explanation,
        } => {
            let mut out = format!("{} {}", "[UNSAFE]".red(), reason);
            let explanation = explanation.trim();
            if !explanation.is_empty() {
                out.push_str(&format!("\n{}\n{}", "Explanation:".yellow(), explanation));
            }
            out
        }
        ProtocolMessage::Plan(plan) => render_plan(plan),
        ProtocolMessage::RequestApproval(step) => format!(
            "\n{}\n  {} {}\n  {} {} ({})",
            "🤖 Approval Needed".yellow(),
            "Desc:".cyan(),
            step.description,
            "Cmd:".yellow(),
            step.action,
            step.tool
        ),
        ProtocolMessage::Result(result) => {
            let mut out = format!(
                "\n{} {}{}\n{} {}",
                "Result:".green(),
                status_icon(result.status),
                status_label(result.status),
                "Info:".blue(),
                result.interpret_message
            );
            if !result.output.trim().is_empty() {
                out.push_str(&format!("\n\n{}\n{}", "Output:".green(), indent_output(&result.output)));
            }
            out
        }
        ProtocolMessage::FinalSummary { summary, nutshell } => format!(
            "\n{}\n  {} {}\n  {} {}",
            "🏁 Summary:".green(),
            "Nutshell:".cyan(),
            nutshell,
            "Details:".cyan(),
            summary
        ),
        ProtocolMessage::DenyCurrentAction => {
            format!("{}", "Action denied. Session ending.".yellow())
        }
        ProtocolMessage::Unrecognized { tag, message } => match message {
            Some(text) if !text.is_empty() => {
                format!("{}\n{}", format!("Unknown message type: {tag}").yellow(), text)
            }
            _ => format!(
                "{}",
                format!("Unknown message type: {tag} (no message content)").yellow()
            ),
        },
        // Log variants were handled above.
        _ => return None,
    };

    Some(text)
}

fn render_plan(plan: &PlanPayload) -> String {
    let mut out = format!(
        "\n{}\n{} {}\n",
        "🧠 Plan:".yellow(),
        "Request:".blue(),
        plan.request
    );

    if plan.is_recipe() {
        out.push_str(&format!("\n{}\n", "Steps:".blue()));
        for (i, step) in plan.recipe_steps.iter().enumerate() {
            out.push_str(&render_step("Step", i + 1, step));
        }
        if let Some(fallback) = &plan.fallback_action {
            out.push_str(&format!(
                "\n{} {} ({})\n",
                "Fallback:".yellow(),
                fallback.action,
                fallback.tool
            ));
        }
    } else {
        out.push_str(&format!("\n{}\n", "Proposed Action:".blue()));
        if let Some(step) = plan.recipe_steps.first() {
            out.push_str(&render_step("Action", 1, step));
        }
        out.push_str(&format!(
            "{}\n",
            "Auto-proceeding to execution for individual step approval.".yellow()
        ));
    }

    out.trim_end_matches('\n').to_string()
}

fn render_step(label: &str, number: usize, step: &RecipeStep) -> String {
    format!(
        "  {} {}. {}\n      {}: {} ({})\n",
        label.cyan(),
        number,
        step.description,
        "Act".yellow(),
        step.action,
        step.tool
    )
}

fn status_icon(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Success => "✅ ",
        ResultStatus::Failure => "❌ ",
        ResultStatus::Cancelled => "⚠️ ",
        ResultStatus::Unknown => "",
    }
}

fn status_label(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Success => "success",
        ResultStatus::Failure => "failure",
        ResultStatus::Cancelled => "cancelled",
        ResultStatus::Unknown => "unknown",
    }
}

/// Indent every output line by four spaces.
pub fn indent_output(output: &str) -> String {
    output
        .split('\n')
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
