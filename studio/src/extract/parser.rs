//! Incremental prose / code classifier for streamed model output.
//!
//! DESIGN
//! ======
//! The parser keeps the cumulative text and rescans it, so markers split
//! across deltas are still found. Once the opening marker is seen every byte
//! after it is code; once the closing marker is seen the artifact is frozen
//! and later text is ignored. A trailing run of one or two backticks is held
//! back while the block is open, since it may be the start of the closing
//! marker. The concatenation of every emitted code chunk therefore equals the
//! final artifact exactly.

#[cfg(test)]
#[path = "parser_test.rs"]
mod parser_test;

use super::{CLOSE_FENCE, OPEN_FENCE, find_marker};

/// What the accumulated output currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Conversational text; no opening marker seen yet.
    Prose,
    /// The opening marker has been seen.
    Code,
}

/// Result of one [`CodeParser::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub mode: Mode,
    /// In prose mode, the delta itself. In code mode, newly confirmed code.
    pub emitted: String,
}

/// Final classification of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Text between the markers (or everything after an unclosed opener).
    Code(String),
    /// A reply without any code block.
    Conversation(String),
}

#[derive(Debug)]
pub struct CodeParser {
    buffer: String,
    mode: Mode,
    /// Byte offset just past the opening marker.
    code_start: usize,
    /// Bytes of code confirmed so far, relative to `code_start`.
    emitted_len: usize,
    closed: bool,
}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeParser {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: String::new(), mode: Mode::Prose, code_start: 0, emitted_len: 0, closed: false }
    }

    /// Consume one decoded delta.
    pub fn feed(&mut self, delta: &str) -> Feed {
        let scan_from = self.buffer.len().saturating_sub(OPEN_FENCE.len() - 1);
        self.buffer.push_str(delta);

        match self.mode {
            Mode::Prose => match find_marker(&self.buffer, OPEN_FENCE, scan_from) {
                Some(pos) => {
                    self.mode = Mode::Code;
                    self.code_start = pos + OPEN_FENCE.len();
                    Feed { mode: Mode::Code, emitted: self.advance_code() }
                }
                None => Feed { mode: Mode::Prose, emitted: delta.to_owned() },
            },
            Mode::Code if self.closed => Feed { mode: Mode::Code, emitted: String::new() },
            Mode::Code => Feed { mode: Mode::Code, emitted: self.advance_code() },
        }
    }

    /// Close out the stream.
    #[must_use]
    pub fn finish(self) -> Extraction {
        match self.mode {
            Mode::Prose => Extraction::Conversation(self.buffer),
            Mode::Code if self.closed => Extraction::Code(self.code().to_owned()),
            Mode::Code => Extraction::Code(self.buffer[self.code_start..].to_owned()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether the closing marker has been seen.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Code confirmed so far. Empty in prose mode.
    #[must_use]
    pub fn code(&self) -> &str {
        match self.mode {
            Mode::Prose => "",
            Mode::Code => &self.buffer[self.code_start..self.code_start + self.emitted_len],
        }
    }

    /// Everything received, markers included.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.buffer
    }

    fn advance_code(&mut self) -> String {
        let region = &self.buffer[self.code_start..];

        let end = match find_marker(region, CLOSE_FENCE, self.emitted_len) {
            Some(close) => {
                self.closed = true;
                close
            }
            None => {
                let held = region.bytes().rev().take_while(|b| *b == b'`').count().min(2);
                region.len() - held
            }
        };

        let emitted = region[self.emitted_len..end].to_owned();
        self.emitted_len = end;
        emitted
    }
}
