//! Linear undo/redo history of artifact snapshots for the active version.
//!
//! Pushing after an undo discards the redo branch. The list never holds two
//! adjacent identical snapshots because a push equal to the current entry is
//! a no-op.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl VersionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot after the cursor. Returns `false` when it equals the
    /// current entry.
    pub fn push(&mut self, artifact: impl Into<String>) -> bool {
        let artifact = artifact.into();
        if self.current() == Some(artifact.as_str()) {
            return false;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(artifact);
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Step back one entry, returning the new current artifact.
    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Step forward one entry, returning the new current artifact.
    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Replace everything with a single entry.
    pub fn reset_to(&mut self, artifact: impl Into<String>) {
        self.entries = vec![artifact.into()];
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
