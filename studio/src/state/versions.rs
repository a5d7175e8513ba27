//! Persisted version list for one project.
//!
//! Names come from the number of versions carrying code at the moment a
//! version gets its artifact, never from sort position, so deleting an old
//! version does not rename the others.

#[cfg(test)]
#[path = "versions_test.rs"]
mod versions_test;

use frames::Frame;

use crate::error::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("version {0} not found")]
    NotFound(String),

    /// The placeholder upgrade already happened for this frame.
    #[error("version {0} already has an artifact")]
    AlreadyUpgraded(String),

    #[error("version {0} already exists")]
    Duplicate(String),

    /// Placeholders cannot be opened in the preview.
    #[error("version {0} has no artifact yet")]
    NoCode(String),
}

impl ErrorCode for VersionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_VERSION_NOT_FOUND",
            Self::AlreadyUpgraded(_) => "E_VERSION_ALREADY_UPGRADED",
            Self::Duplicate(_) => "E_VERSION_DUPLICATE",
            Self::NoCode(_) => "E_VERSION_NO_CODE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionList {
    frames: Vec<Frame>,
}

impl VersionList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    // --- Queries ---

    /// Newest first; ties broken by `frame_id` descending.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Frame> {
        let mut sorted: Vec<&Frame> = self.frames.iter().collect();
        sorted.sort_by(|a, b| {
            b.created_on
                .cmp(&a.created_on)
                .then_with(|| b.frame_id.cmp(&a.frame_id))
        });
        sorted
    }

    /// Versions with an artifact, newest first.
    #[must_use]
    pub fn completed(&self) -> Vec<&Frame> {
        self.sorted().into_iter().filter(|f| f.has_code()).collect()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.frames.iter().filter(|f| f.has_code()).count()
    }

    /// Name for the next version to receive an artifact.
    #[must_use]
    pub fn next_version_name(&self) -> String {
        format!("Version {}", self.completed_count() + 1)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Frame> {
        self.sorted().into_iter().next()
    }

    #[must_use]
    pub fn latest_completed(&self) -> Option<&Frame> {
        self.completed().into_iter().next()
    }

    #[must_use]
    pub fn get(&self, frame_id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.frame_id == frame_id)
    }

    #[must_use]
    pub fn contains(&self, frame_id: &str) -> bool {
        self.get(frame_id).is_some()
    }

    /// Stored name, or `Version N` by position among completed versions.
    #[must_use]
    pub fn display_name(&self, frame: &Frame) -> String {
        if let Some(name) = frame.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        let completed = self.completed();
        match completed.iter().position(|f| f.frame_id == frame.frame_id) {
            Some(index) => format!("Version {}", completed.len() - index),
            None => self.next_version_name(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    // --- Mutations ---

    /// Add a version.
    ///
    /// # Errors
    ///
    /// [`VersionError::Duplicate`] if the `frame_id` is already listed.
    pub fn insert(&mut self, frame: Frame) -> Result<(), VersionError> {
        if self.contains(&frame.frame_id) {
            return Err(VersionError::Duplicate(frame.frame_id));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn remove(&mut self, frame_id: &str) -> Option<Frame> {
        let index = self.frames.iter().position(|f| f.frame_id == frame_id)?;
        Some(self.frames.remove(index))
    }

    /// Give a placeholder its artifact and name, in place.
    ///
    /// # Errors
    ///
    /// [`VersionError::NotFound`] for an unknown id and
    /// [`VersionError::AlreadyUpgraded`] when the version already has code.
    pub fn upgrade(&mut self, frame_id: &str, code: impl Into<String>) -> Result<&Frame, VersionError> {
        let name = self.next_version_name();
        let frame = self.get_mut(frame_id)?;
        if frame.has_code() {
            return Err(VersionError::AlreadyUpgraded(frame_id.to_owned()));
        }
        frame.design_code = Some(code.into());
        frame.name = Some(name);
        Ok(frame)
    }

    /// Replace a completed version's artifact with an edited one.
    ///
    /// # Errors
    ///
    /// [`VersionError::NotFound`] for an unknown id.
    pub fn overwrite_code(&mut self, frame_id: &str, code: impl Into<String>) -> Result<(), VersionError> {
        self.get_mut(frame_id)?.design_code = Some(code.into());
        Ok(())
    }

    fn get_mut(&mut self, frame_id: &str) -> Result<&mut Frame, VersionError> {
        self.frames
            .iter_mut()
            .find(|f| f.frame_id == frame_id)
            .ok_or_else(|| VersionError::NotFound(frame_id.to_owned()))
    }
}
