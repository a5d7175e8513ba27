//! Event-stream codec for the model endpoint.
//!
//! The endpoint answers with newline-delimited records:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"<div"}}]}
//! data: [DONE]
//! ```
//!
//! Transport chunks do not respect record boundaries, so [`LineBuffer`]
//! accumulates raw bytes and only yields complete lines. [`decode_record`]
//! turns one line into a [`Record`]; malformed payloads surface as
//! [`CodecError`] so the caller can skip exactly that record.

use serde::Deserialize;

/// Prefix carried by every payload line.
pub const DATA_PREFIX: &str = "data:";

/// Payload of the terminating record.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Error returned by [`decode_record`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The payload after `data:` was not the expected JSON shape.
    #[error("malformed stream record: {0}")]
    Json(#[from] serde_json::Error),
}

/// One decoded stream record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    /// A non-empty content delta.
    Delta(String),
    /// The termination sentinel.
    Done,
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one complete line.
///
/// Returns `Ok(None)` for lines that carry nothing: blanks, comments, other
/// field names, and deltas without content.
///
/// # Errors
///
/// Returns [`CodecError::Json`] when a `data:` payload is not valid JSON of the
/// expected shape.
pub fn decode_record(line: &str) -> Result<Option<Record>, CodecError> {
    let line = line.trim();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    let payload = payload.trim_start();
    if payload == DONE_SENTINEL {
        return Ok(Some(Record::Done));
    }

    let chunk: ChunkPayload = serde_json::from_str(payload)?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if content.is_empty() { Ok(None) } else { Ok(Some(Record::Delta(content))) }
}

/// Encode a content delta the way the endpoint does. Used by mock transports.
#[must_use]
pub fn encode_delta(content: &str) -> String {
    let payload = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
    format!("{DATA_PREFIX} {payload}\n\n")
}

/// Encode the termination record.
#[must_use]
pub fn encode_done() -> String {
    format!("{DATA_PREFIX} {DONE_SENTINEL}\n\n")
}

/// Reassembles complete lines from arbitrarily split transport chunks.
///
/// Bytes are buffered rather than decoded per chunk, so a multi-byte UTF-8
/// sequence split across two chunks is decoded intact once its line completes.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without terminators.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Flush a trailing line that never received its terminator.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }

    /// Bytes buffered while waiting for a line terminator.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
