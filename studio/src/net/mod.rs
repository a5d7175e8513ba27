//! Collaborator interfaces: project storage and the streaming model endpoint.
//!
//! DESIGN
//! ======
//! The orchestrator only sees the [`ProjectApi`] and [`ModelApi`] traits.
//! [`http::HttpClient`] implements both against the collaborator's REST
//! surface; tests swap in hand-written mocks.
//!
//! ERROR HANDLING
//! ==============
//! Transport and status failures map to [`ApiError`] with the response body
//! kept for diagnostics. Successful responses are wrapped in `{ "data": .. }`;
//! a missing payload is [`ApiError::Empty`].

pub mod http;

use std::pin::Pin;

use async_trait::async_trait;
use frames::{FrameDetail, Message, Project};
use futures::Stream;
use serde::Serialize;

use crate::error::ErrorCode;

pub use http::HttpClient;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The collaborator answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The envelope carried no `data`.
    #[error("response carried no data")]
    Empty,

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
            Self::Empty => "E_API_EMPTY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

/// Raw body chunks of a streaming response, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send>>;

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// `POST /projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub project_id: String,
    pub frame_id: String,
    pub messages: Vec<Message>,
}

/// `PUT /frames`: placeholder upgrade or an edited artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameUpdate {
    pub design_code: String,
    pub frame_id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `POST /frames/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVersion {
    pub project_id: String,
    pub frame_id: String,
    pub name: String,
    pub design_code: String,
    pub messages: Vec<Message>,
}

/// `PUT /frames/chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub frame_id: String,
    pub project_id: String,
}

// =============================================================================
// TRAITS
// =============================================================================

/// Project and version storage.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    async fn create_project(&self, project: &NewProject) -> Result<(), ApiError>;

    /// Project metadata, description, and version list.
    async fn project(&self, project_id: &str) -> Result<Project, ApiError>;

    /// One version's artifact and chat.
    async fn frame(&self, project_id: &str, frame_id: &str) -> Result<FrameDetail, ApiError>;

    async fn save_frame(&self, update: &FrameUpdate) -> Result<(), ApiError>;

    async fn create_version(&self, version: &NewVersion) -> Result<(), ApiError>;

    async fn save_chat(&self, snapshot: &ChatSnapshot) -> Result<(), ApiError>;

    async fn delete_frame(&self, frame_id: &str) -> Result<(), ApiError>;

    async fn delete_message(&self, message_id: i64) -> Result<(), ApiError>;

    async fn clear_chat(&self, frame_id: &str) -> Result<(), ApiError>;
}

/// The streaming model endpoint.
#[async_trait]
pub trait ModelApi: Send + Sync {
    /// Open a generation for one synthesized prompt.
    async fn stream(&self, prompt: &str) -> Result<ByteStream, ApiError>;
}

#[cfg(test)]
#[path = "mock_test.rs"]
pub(crate) mod mock;
