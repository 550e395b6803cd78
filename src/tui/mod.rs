// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Console output for OG.
//!
//! Rendering is injected through the [`Console`] trait so the session never
//! writes to the terminal directly. [`TerminalConsole`] is the real
//! implementation; tests substitute a capturing console.

mod console;
pub mod terminal_ui;

#[cfg(test)]
pub(crate) mod recording;

pub use console::{Console, Notice};
pub use terminal_ui::{render_message, TerminalConsole};
