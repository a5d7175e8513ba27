//! reqwest client for the collaborator REST surface.

use std::time::Duration;

use async_trait::async_trait;
use frames::{Envelope, FrameDetail, Project};
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, ByteStream, ChatSnapshot, FrameUpdate, ModelApi, NewProject, NewVersion, ProjectApi};
use crate::config::StudioConfig;

const EVENT_STREAM: &str = "text/event-stream";

pub struct HttpClient {
    http: reqwest::Client,
    /// No total timeout: a generation may stream for longer than any request.
    stream_http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct ModelRequest<'a> {
    messages: [ModelMessage<'a>; 1],
}

#[derive(Serialize)]
struct ModelMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl HttpClient {
    /// Build both HTTP clients from config.
    ///
    /// # Errors
    ///
    /// [`ApiError::HttpClientBuild`] if reqwest cannot build a client.
    pub fn new(config: &StudioConfig) -> Result<Self, ApiError> {
        let connect = Duration::from_secs(config.timeouts.connect_secs);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(connect)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let stream_http = reqwest::Client::builder()
            .connect_timeout(connect)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            stream_http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            token: config.api_token.clone(),
        })
    }

    fn request(&self, client: &reqwest::Client, method: Method, path: &str) -> RequestBuilder {
        let builder = client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json(&self, method: Method, path: &str, body: &(impl Serialize + Sync)) -> Result<(), ApiError> {
        send(self.request(&self.http, method, path).json(body))
            .await
            .map(|_| ())
    }
}

async fn send(builder: RequestBuilder) -> Result<String, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::Status { status: status.as_u16(), body: text });
    }
    Ok(text)
}

async fn send_for_data<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let text = send(builder).await?;
    let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))?;
    envelope.data.ok_or(ApiError::Empty)
}

#[async_trait]
impl ProjectApi for HttpClient {
    async fn create_project(&self, project: &NewProject) -> Result<(), ApiError> {
        self.send_json(Method::POST, "/projects", project).await
    }

    async fn project(&self, project_id: &str) -> Result<Project, ApiError> {
        let builder = self.request(&self.http, Method::GET, &format!("/projects/{project_id}"));
        send_for_data(builder).await
    }

    async fn frame(&self, project_id: &str, frame_id: &str) -> Result<FrameDetail, ApiError> {
        let builder = self
            .request(&self.http, Method::GET, "/frames")
            .query(&[("frameId", frame_id), ("projectId", project_id)]);
        send_for_data(builder).await
    }

    async fn save_frame(&self, update: &FrameUpdate) -> Result<(), ApiError> {
        self.send_json(Method::PUT, "/frames", update).await
    }

    async fn create_version(&self, version: &NewVersion) -> Result<(), ApiError> {
        self.send_json(Method::POST, "/frames/version", version).await
    }

    async fn save_chat(&self, snapshot: &ChatSnapshot) -> Result<(), ApiError> {
        self.send_json(Method::PUT, "/frames/chats", snapshot).await
    }

    async fn delete_frame(&self, frame_id: &str) -> Result<(), ApiError> {
        let builder = self.request(&self.http, Method::DELETE, &format!("/frames/{frame_id}"));
        send(builder).await.map(|_| ())
    }

    async fn delete_message(&self, message_id: i64) -> Result<(), ApiError> {
        let builder = self.request(&self.http, Method::DELETE, &format!("/chats/{message_id}"));
        send(builder).await.map(|_| ())
    }

    async fn clear_chat(&self, frame_id: &str) -> Result<(), ApiError> {
        let builder = self.request(&self.http, Method::DELETE, &format!("/chats/frame/{frame_id}"));
        send(builder).await.map(|_| ())
    }
}

#[async_trait]
impl ModelApi for HttpClient {
    async fn stream(&self, prompt: &str) -> Result<ByteStream, ApiError> {
        let body = ModelRequest { messages: [ModelMessage { role: "user", content: prompt }] };
        let response = self
            .request(&self.stream_http, Method::POST, "/ai-model")
            .header(header::ACCEPT, EVENT_STREAM)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), body });
        }
        debug!(status = status.as_u16(), "model stream opened");

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|e| ApiError::Request(e.to_string())));
        Ok(Box::pin(chunks))
    }
}
