//! Code extraction from model output.
//!
//! [`parser`] classifies a live token stream into prose and a single fenced
//! code block; [`fence`] applies the same fence rule to a stored artifact.

pub mod fence;
pub mod parser;

pub use fence::strip_fences;
pub use parser::{CodeParser, Extraction, Feed, Mode};

/// Marker that opens the artifact block.
pub const OPEN_FENCE: &str = "```html";

/// Marker that closes it.
pub const CLOSE_FENCE: &str = "```";

/// Byte offset of `needle` in `haystack` at or after `from`.
///
/// Markers are ASCII, so a byte match always lands on a char boundary.
pub(crate) fn find_marker(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let bytes = haystack.as_bytes().get(from..)?;
    bytes
        .windows(needle.len())
        .position(|window| window == needle.as_bytes())
        .map(|pos| from + pos)
}
