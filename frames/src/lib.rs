//! Shared design-session model and the generation event-stream codec.
//!
//! This crate owns the shapes exchanged with the project collaborator
//! (`Frame`, `Project`, `FrameDetail`, `Message`) and the line-oriented
//! record format streamed back by the model endpoint ([`stream`]). Both the
//! `studio` orchestrator and the `cli` depend on it; nothing here performs I/O.

pub mod stream;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Ids the collaborator hands back when a route parameter was never filled in.
const UNSET_ID_LITERALS: [&str; 2] = ["undefined", "null"];

/// Whether `id` names something worth fetching.
///
/// Empty ids and the `"undefined"` / `"null"` literals mean "nothing to fetch"
/// rather than an error.
#[must_use]
pub fn is_fetchable_id(id: &str) -> bool {
    let trimmed = id.trim();
    !trimmed.is_empty() && !UNSET_ID_LITERALS.contains(&trimmed)
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Author of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Prompt typed by the user.
    User,
    /// Reply (or generation status) produced for the user.
    Assistant,
}

/// One entry in a design conversation. Vector order is render order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Remote id, assigned only after a save round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role: Role,
    pub content: String,
}

impl Message {
    /// A not-yet-persisted user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { id: None, role: Role::User, content: content.into() }
    }

    /// A not-yet-persisted assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { id: None, role: Role::Assistant, content: content.into() }
    }
}

// =============================================================================
// VERSIONS
// =============================================================================

/// A persisted version of a project's artifact.
///
/// `design_code == None` marks a placeholder: the prompt was accepted but no
/// generation has completed for it yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub frame_id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub design_code: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl Frame {
    /// A placeholder version with no artifact yet.
    #[must_use]
    pub fn placeholder(frame_id: impl Into<String>, project_id: impl Into<String>, created_on: OffsetDateTime) -> Self {
        Self { frame_id: frame_id.into(), project_id: project_id.into(), name: None, design_code: None, created_on }
    }

    /// Whether this version carries a real artifact. Blank code counts as none.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.design_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    /// Inverse of [`Frame::has_code`].
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        !self.has_code()
    }
}

/// Project metadata plus every version it owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    /// Free text used as generation context.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

/// One version's artifact together with its chat history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDetail {
    pub frame_id: String,
    pub project_id: String,
    #[serde(default)]
    pub design_code: Option<String>,
    #[serde(default)]
    pub chat_messages: Vec<Message>,
}

/// Envelope the collaborator wraps every JSON response in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
