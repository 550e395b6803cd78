// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bounded line reader over the agent's stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::error::ProcessError;

/// Largest accepted stdout line (1 MiB), newline excluded.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Line stream over the agent's stdout.
///
/// Lines are yielded in emission order without their terminator. A line
/// over the limit is an error rather than being truncated or buffered
/// without bound, unless the stream was built with [`skip_long_lines`].
/// Invalid UTF-8 is replaced, not rejected.
///
/// [`skip_long_lines`]: AgentLines::skip_long_lines
pub struct AgentLines {
    reader: Box<dyn AsyncBufRead + Unpin + Send>,
    buf: Vec<u8>,
    limit: usize,
    skip_long: bool,
}

impl AgentLines {
    /// Wrap a reader with the default line limit.
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::with_limit(reader, MAX_LINE_BYTES)
    }

    /// Wrap a reader with a custom line limit.
    pub fn with_limit<R>(reader: R, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            reader: Box::new(BufReader::new(reader)),
            buf: Vec::new(),
            limit,
            skip_long: false,
        }
    }

    /// Drop over-long lines instead of failing on them.
    pub fn skip_long_lines(mut self) -> Self {
        self.skip_long = true;
        self
    }

    /// Maximum line length in bytes, terminator excluded.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Read the next line. `Ok(None)` means the stream closed.
    pub async fn next_line(&mut self) -> Result<Option<String>, ProcessError> {
        loop {
            self.buf.clear();
            match self.fill_line().await {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(ProcessError::LineTooLong { limit }) if self.skip_long => {
                    debug!(limit, "Skipping over-long line");
                    self.discard_rest().await?;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            return Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()));
        }
    }

    /// Buffer one line. Returns `false` at end of stream.
    ///
    /// On overflow nothing past the last accepted chunk is consumed, so the
    /// reader is still inside the offending line.
    async fn fill_line(&mut self) -> Result<bool, ProcessError> {
        loop {
            let available = self
                .reader
                .fill_buf()
                .await
                .map_err(|e| ProcessError::Read(e.to_string()))?;

            if available.is_empty() {
                if self.buf.is_empty() {
                    return Ok(false);
                }
                // Final line without a trailing newline.
                let cr = usize::from(self.buf.last() == Some(&b'\r'));
                if self.buf.len() - cr > self.limit {
                    return Err(ProcessError::LineTooLong { limit: self.limit });
                }
                return Ok(true);
            }

            let newline = available.iter().position(|b| *b == b'\n');
            let content = newline.unwrap_or(available.len());
            let total = self.buf.len() + content;

            // A trailing CR does not count against the limit.
            let too_long = match newline {
                Some(_) => {
                    let ends_with_cr = if content > 0 {
                        available[content - 1] == b'\r'
                    } else {
                        self.buf.last() == Some(&b'\r')
                    };
                    total - usize::from(ends_with_cr) > self.limit
                }
                None => total > self.limit + 1,
            };
            if too_long {
                return Err(ProcessError::LineTooLong { limit: self.limit });
            }

            self.buf.extend_from_slice(&available[..content]);
            let consumed = newline.map_or(content, |i| i + 1);
            AsyncBufReadExt::consume(&mut self.reader, consumed);

            if newline.is_some() {
                return Ok(true);
            }
        }
    }

    /// Consume input up to and including the next newline.
    async fn discard_rest(&mut self) -> Result<(), ProcessError> {
        loop {
            let available = self
                .reader
                .fill_buf()
                .await
                .map_err(|e| ProcessError::Read(e.to_string()))?;
            if available.is_empty() {
                return Ok(());
            }

            let (consumed, done) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            AsyncBufReadExt::consume(&mut self.reader, consumed);
            if done {
                return Ok(());
            }
        }
    }
}

impl std::fmt::Debug for AgentLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLines")
            .field("limit", &self.limit)
            .field("skip_long", &self.skip_long)
            .finish_non_exhaustive()
    }
}
