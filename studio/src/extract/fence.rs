//! Fence stripping for stored artifacts.

use super::{CLOSE_FENCE, OPEN_FENCE, find_marker};

/// Recover the artifact from stored text.
///
/// With an opening marker, keep what follows it up to the next closing
/// marker (or the end). Without one the text is taken as-is. Either way the
/// result is trimmed.
#[must_use]
pub fn strip_fences(text: &str) -> String {
    let Some(open) = find_marker(text, OPEN_FENCE, 0) else {
        return text.trim().to_owned();
    };
    let body = &text[open + OPEN_FENCE.len()..];
    let end = find_marker(body, CLOSE_FENCE, 0).unwrap_or(body.len());
    body[..end].trim().to_owned()
}

#[cfg(test)]
#[path = "fence_test.rs"]
mod fence_test;
