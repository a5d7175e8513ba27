//! Generation orchestrator: one prompt → stream → artifact → version cycle.
//!
//! DESIGN
//! ======
//! The orchestrator owns the session: conversation, persisted versions, and
//! the undo history of the active version. A generation appends the user
//! message and an assistant placeholder, streams the model response through
//! the line buffer, record decoder, and [`CodeParser`], and publishes the
//! partial artifact on a `watch` channel while the session follows the live
//! stream. On completion the artifact either upgrades the active placeholder
//! version in place or becomes a new version.
//!
//! Only one generation runs per session. The latch lives in
//! [`GenerationState`] and is taken with a synchronous check-and-set, so an
//! overlapping request is rejected before it can reach the network.
//!
//! ERROR HANDLING
//! ==============
//! A transport failure rolls the assistant placeholder back to an apology,
//! releases the latch into [`Phase::Error`], persists nothing, and emits an
//! error notice. Malformed stream records are skipped individually. Unset
//! ids (`""`, `"undefined"`) skip their fetch instead of failing.

#[cfg(test)]
#[path = "generation_test.rs"]
mod generation_test;

use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Duration;

use frames::stream::{LineBuffer, Record, decode_record};
use frames::{Frame, Message, Role, is_fetchable_id};
use futures::StreamExt;
use rand::Rng;
use time::OffsetDateTime;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::chat_sync::ChatSync;
use super::prompt::build_prompt;
use crate::config::StudioConfig;
use crate::error::ErrorCode;
use crate::extract::{CodeParser, Extraction, Mode, strip_fences};
use crate::net::{ApiError, ChatSnapshot, FrameUpdate, ModelApi, NewProject, NewVersion, ProjectApi};
use crate::state::session::set_assistant_tail;
use crate::state::{Session, VersionError, VersionHistory, VersionList};

pub const STATUS_GENERATING: &str = "Generating your website...";
pub const STATUS_READY: &str = "Your code is ready!";
pub const STATUS_FAILED: &str = "Sorry, something went wrong.";

pub const NOTICE_READY: &str = "Website is ready!";
pub const NOTICE_FAILED: &str = "Failed to generate code";
pub const NOTICE_SAVED: &str = "Saved successfully!";
pub const NOTICE_SAVE_FAILED: &str = "Failed to save website";
pub const NOTICE_MESSAGE_DELETED: &str = "Message deleted";
pub const NOTICE_CHAT_CLEARED: &str = "Chat cleared";
pub const NOTICE_PREVIEW_REFRESHED: &str = "Preview refreshed!";

/// Frame ids are random numbers below this bound.
const FRAME_ID_BOUND: u32 = 10_000;

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    /// The last generation failed. A new one may start.
    Error,
}

/// Session-scoped generation latch and the one-shot auto-resume flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationState {
    phase: Phase,
    auto_resumed: bool,
}

impl Default for GenerationState {
    fn default() -> Self {
        Self { phase: Phase::Idle, auto_resumed: false }
    }
}

impl GenerationState {
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Take the latch. Returns `false` while a generation is in flight.
    pub fn try_begin(&mut self) -> bool {
        if self.phase == Phase::Generating {
            return false;
        }
        self.phase = Phase::Generating;
        true
    }

    /// Release the latch.
    pub fn finish(&mut self, succeeded: bool) {
        self.phase = if succeeded { Phase::Idle } else { Phase::Error };
    }

    /// Claim the single auto-resume for this session.
    pub fn claim_auto_resume(&mut self) -> bool {
        !std::mem::replace(&mut self.auto_resumed, true)
    }

    fn rearm_auto_resume(&mut self) {
        self.auto_resumed = false;
    }
}

// =============================================================================
// EVENTS AND OUTCOMES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Events for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioEvent {
    /// A user-visible toast.
    Notice { level: NoticeLevel, text: String },
    /// The conversation changed.
    MessagesChanged,
    /// The persisted version list changed.
    VersionsChanged,
    /// A different version is now active. Empty when none is left.
    ActiveVersionChanged { frame_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Another generation was in flight; nothing happened.
    Rejected,
    /// The response carried an artifact.
    Code {
        frame_id: String,
        artifact: String,
        /// `true` when a placeholder version was upgraded in place.
        upgraded: bool,
    },
    /// The response was a conversational reply.
    Conversation { text: String },
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    /// The model stream could not be opened or broke mid-response.
    #[error("model stream failed: {0}")]
    Stream(ApiError),

    /// The artifact was produced but could not be saved.
    #[error("saving version failed: {0}")]
    Persist(ApiError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Version(#[from] VersionError),
}

impl ErrorCode for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "E_EMPTY_PROMPT",
            Self::Stream(_) => "E_GENERATION_STREAM",
            Self::Persist(_) => "E_GENERATION_PERSIST",
            Self::Api(e) => e.error_code(),
            Self::Version(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Stream(e) | Self::Persist(e) | Self::Api(e) => e.retryable(),
            Self::EmptyPrompt | Self::Version(_) => false,
        }
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

struct Inner {
    session: Session,
    versions: VersionList,
    history: VersionHistory,
    /// Cleared by a manual version switch; set again when a generation starts.
    following: bool,
}

impl Inner {
    fn new(session: Session) -> Self {
        Self { session, versions: VersionList::new(), history: VersionHistory::new(), following: true }
    }

    /// Whether the session has `run`'s version open.
    fn shows(&self, run: &Run) -> bool {
        self.session.project_id == run.project_id && self.session.frame_id == run.frame_id
    }

    /// Whether the preview should track `run`'s partial artifacts.
    fn follows(&self, run: &Run) -> bool {
        self.following && self.shows(run)
    }
}

/// One generation's own conversation, bound to the version it started on.
///
/// The session may switch versions or projects while the stream runs; the
/// run keeps writing here and mirrors into the session only while its
/// version is the one on screen.
struct Run {
    project_id: String,
    frame_id: String,
    messages: Vec<Message>,
    /// The version had no code when the run started.
    placeholder: bool,
    /// Name for the version this run completes or creates.
    version_name: String,
}

enum Persist {
    Upgrade(FrameUpdate),
    Create(NewVersion),
}

pub struct Orchestrator {
    projects: Arc<dyn ProjectApi>,
    model: Arc<dyn ModelApi>,
    config: StudioConfig,
    inner: Mutex<Inner>,
    state: std::sync::Mutex<GenerationState>,
    artifact_tx: watch::Sender<String>,
    events: mpsc::UnboundedSender<StudioEvent>,
    chat_sync: ChatSync,
}

impl Orchestrator {
    /// Build an orchestrator with an empty session. Must be called inside a
    /// tokio runtime: the chat writer is spawned here.
    #[must_use]
    pub fn new(
        projects: Arc<dyn ProjectApi>,
        model: Arc<dyn ModelApi>,
        config: StudioConfig,
        events: mpsc::UnboundedSender<StudioEvent>,
    ) -> Self {
        let chat_sync = ChatSync::spawn(projects.clone(), Duration::from_millis(config.chat_save_debounce_ms));
        let (artifact_tx, _) = watch::channel(String::new());
        Self {
            projects,
            model,
            config,
            inner: Mutex::new(Inner::new(Session::default())),
            state: std::sync::Mutex::new(GenerationState::default()),
            artifact_tx,
            events,
            chat_sync,
        }
    }

    // --- Queries ---

    /// Artifact updates for the preview. Partial artifacts may be superseded.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.artifact_tx.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.gen_state().phase()
    }

    pub async fn session(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    pub async fn versions(&self) -> VersionList {
        self.inner.lock().await.versions.clone()
    }

    /// The artifact the preview should show.
    pub async fn current_artifact(&self) -> Option<String> {
        self.inner.lock().await.history.current().map(str::to_owned)
    }

    pub async fn can_undo(&self) -> bool {
        self.inner.lock().await.history.can_undo()
    }

    pub async fn can_redo(&self) -> bool {
        self.inner.lock().await.history.can_redo()
    }

    /// Write any pending chat snapshot now.
    pub async fn flush_chat(&self) {
        self.chat_sync.flush().await;
    }

    // --- Session lifecycle ---

    /// Create a project whose first version is a placeholder for `prompt`.
    /// Loading the returned ids resumes the generation.
    ///
    /// # Errors
    ///
    /// [`GenerationError::EmptyPrompt`] or the collaborator's failure.
    pub async fn start_project(&self, prompt: &str) -> Result<(String, String), GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let project_id = Uuid::new_v4().to_string();
        let frame_id = fresh_frame_id(&VersionList::new());
        let request = NewProject {
            project_id: project_id.clone(),
            frame_id: frame_id.clone(),
            messages: vec![Message::user(prompt)],
        };
        self.projects.create_project(&request).await?;
        info!(%project_id, %frame_id, "project created");
        Ok((project_id, frame_id))
    }

    /// Open a project version: description, version list, artifact, and chat.
    ///
    /// If the newest version is still a placeholder and the conversation ends
    /// with a user prompt, that prompt is generated once and its outcome
    /// returned.
    ///
    /// # Errors
    ///
    /// Collaborator fetch failures, or the resumed generation's error.
    pub async fn load_session(
        &self,
        project_id: &str,
        frame_id: &str,
    ) -> Result<Option<GenerationOutcome>, GenerationError> {
        let project_id = project_id.trim();
        let frame_id = frame_id.trim();

        {
            let mut inner = self.inner.lock().await;
            let reopened = inner.session.project_id == project_id && inner.session.frame_id == frame_id;
            if !reopened {
                self.gen_state().rearm_auto_resume();
            }
            *inner = Inner::new(Session::new(project_id, frame_id));
        }

        let project = if is_fetchable_id(project_id) {
            Some(self.projects.project(project_id).await?)
        } else {
            debug!(project_id, "project id not set; skipping project fetch");
            None
        };
        let detail = if is_fetchable_id(project_id) && is_fetchable_id(frame_id) {
            Some(self.projects.frame(project_id, frame_id).await?)
        } else {
            debug!(frame_id, "frame id not set; skipping frame fetch");
            None
        };

        let resume_prompt = {
            let mut inner = self.inner.lock().await;
            if let Some(project) = project {
                inner.session.description = project.description;
                inner.versions = VersionList::from_frames(project.frames);
            }
            if let Some(detail) = detail {
                inner.session.messages = detail.chat_messages;
                let code = detail
                    .design_code
                    .as_deref()
                    .map(strip_fences)
                    .filter(|code| !code.is_empty());
                if !inner.versions.contains(frame_id) {
                    let frame = Frame {
                        frame_id: frame_id.to_owned(),
                        project_id: project_id.to_owned(),
                        name: None,
                        design_code: code.clone(),
                        created_on: OffsetDateTime::now_utc(),
                    };
                    inner.versions.insert(frame)?;
                }
                match code {
                    Some(code) => {
                        self.publish(&code);
                        inner.history.reset_to(code);
                    }
                    None => {
                        inner.history.clear();
                        self.publish("");
                    }
                }
            }
            let latest_is_placeholder = inner.versions.latest().is_some_and(Frame::is_placeholder);
            inner
                .session
                .pending_prompt()
                .filter(|_| latest_is_placeholder)
                .map(str::to_owned)
        };

        self.emit(StudioEvent::VersionsChanged);
        self.emit(StudioEvent::MessagesChanged);
        self.emit(StudioEvent::ActiveVersionChanged { frame_id: frame_id.to_owned() });
        info!(project_id, frame_id, "session loaded");

        let Some(prompt) = resume_prompt else {
            return Ok(None);
        };
        let claimed = self.gen_state().claim_auto_resume();
        if !claimed {
            debug!(frame_id, "auto-resume already used for this session");
            return Ok(None);
        }
        info!(frame_id, "resuming generation for placeholder version");
        self.generate(&prompt, true).await.map(Some)
    }

    // --- Generation ---

    /// Run one generation for `prompt`.
    ///
    /// With `is_auto_resume` the prompt is already the last chat message and
    /// is not appended again.
    ///
    /// # Errors
    ///
    /// [`GenerationError::Stream`] on transport failure and
    /// [`GenerationError::Persist`] when the finished version cannot be saved.
    pub async fn generate(&self, prompt: &str, is_auto_resume: bool) -> Result<GenerationOutcome, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let begun = self.gen_state().try_begin();
        if !begun {
            debug!("generation already in flight; request dropped");
            return Ok(GenerationOutcome::Rejected);
        }

        let result = self.run_generation(prompt, is_auto_resume).await;
        self.gen_state().finish(result.is_ok());
        result
    }

    async fn run_generation(&self, prompt: &str, is_auto_resume: bool) -> Result<GenerationOutcome, GenerationError> {
        let (mut run, prompt_text) = {
            let mut inner = self.inner.lock().await;
            let mut context = inner.session.messages.clone();
            if is_auto_resume && context.last().is_some_and(|m| m.role == Role::User && m.content.trim() == prompt) {
                context.pop();
            }
            if !is_auto_resume {
                inner.session.messages.push(Message::user(prompt));
            }
            inner.session.messages.push(Message::assistant(""));
            inner.following = true;
            self.schedule_chat_save(&inner);

            let frame_id = inner.session.frame_id.clone();
            let run = Run {
                project_id: inner.session.project_id.clone(),
                placeholder: inner.versions.get(&frame_id).map_or(true, Frame::is_placeholder),
                version_name: inner.versions.next_version_name(),
                messages: inner.session.messages.clone(),
                frame_id,
            };
            let text = build_prompt(
                prompt,
                inner.session.description.as_deref(),
                &self.config.default_description,
                &context,
                self.config.context_turns,
            );
            (run, text)
        };
        self.emit(StudioEvent::MessagesChanged);
        info!(frame_id = %run.frame_id, auto_resume = is_auto_resume, "generation started");

        let mut stream = match self.model.stream(&prompt_text).await {
            Ok(stream) => stream,
            Err(error) => return Err(self.fail(&mut run, error).await),
        };

        let mut parser = CodeParser::new();
        let mut lines = LineBuffer::new();
        let mut done = false;
        while !done {
            let Some(chunk) = stream.next().await else {
                break;
            };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => return Err(self.fail(&mut run, error).await),
            };
            for line in lines.push(&chunk) {
                if self.consume_line(&mut run, &line, &mut parser).await {
                    done = true;
                    break;
                }
            }
        }
        if !done {
            if let Some(line) = lines.finish() {
                self.consume_line(&mut run, &line, &mut parser).await;
            }
        }

        let response = parser.response().to_owned();
        match parser.finish() {
            Extraction::Code(code) if !code.trim().is_empty() => {
                self.complete_with_code(run, code.trim().to_owned()).await
            }
            Extraction::Code(_) => Ok(self.complete_conversation(&mut run, response).await),
            Extraction::Conversation(text) => Ok(self.complete_conversation(&mut run, text).await),
        }
    }

    /// Decode one stream line and feed it. Returns `true` on the done record.
    async fn consume_line(&self, run: &mut Run, line: &str, parser: &mut CodeParser) -> bool {
        let delta = match decode_record(line) {
            Ok(Some(Record::Delta(delta))) => delta,
            Ok(Some(Record::Done)) => return true,
            Ok(None) => return false,
            Err(error) => {
                debug!(%error, "skipping malformed stream record");
                return false;
            }
        };

        let was_code = parser.mode() == Mode::Code;
        let feed = parser.feed(&delta);
        let mut inner = self.inner.lock().await;
        if feed.mode == Mode::Code && inner.follows(run) && !feed.emitted.is_empty() {
            self.publish(parser.code());
        }
        let tail = match feed.mode {
            Mode::Prose => parser.response(),
            Mode::Code if !was_code => STATUS_GENERATING,
            Mode::Code => return false,
        };
        let shown = self.set_run_tail(&mut inner, run, tail);
        drop(inner);
        if shown {
            self.emit(StudioEvent::MessagesChanged);
        }
        false
    }

    async fn complete_conversation(&self, run: &mut Run, text: String) -> GenerationOutcome {
        let shown = {
            let mut inner = self.inner.lock().await;
            self.set_run_tail(&mut inner, run, text.as_str())
        };
        if shown {
            self.emit(StudioEvent::MessagesChanged);
        }
        info!(chars = text.len(), "generation finished without code");
        GenerationOutcome::Conversation { text }
    }

    async fn complete_with_code(&self, mut run: Run, artifact: String) -> Result<GenerationOutcome, GenerationError> {
        let (persist, frame_id, upgraded, switched) = {
            let mut inner = self.inner.lock().await;
            let following = inner.follows(&run);
            self.set_run_tail(&mut inner, &mut run, STATUS_READY);
            // The host may have opened another project meanwhile; its version
            // list is not this run's.
            let same_project = inner.session.project_id == run.project_id;

            if run.placeholder {
                let mut name = Some(run.version_name.clone());
                if same_project {
                    if !inner.versions.contains(&run.frame_id) {
                        let now = OffsetDateTime::now_utc();
                        let frame = Frame::placeholder(run.frame_id.as_str(), run.project_id.as_str(), now);
                        inner.versions.insert(frame)?;
                    }
                    name.clone_from(&inner.versions.upgrade(&run.frame_id, artifact.as_str())?.name);
                }
                if inner.shows(&run) {
                    inner.history.reset_to(artifact.as_str());
                    self.publish(&artifact);
                }
                let update = FrameUpdate {
                    design_code: artifact.clone(),
                    frame_id: run.frame_id.clone(),
                    project_id: run.project_id.clone(),
                    name,
                };
                (Persist::Upgrade(update), run.frame_id.clone(), true, false)
            } else {
                let new_id = fresh_frame_id(&inner.versions);
                let name = if same_project { inner.versions.next_version_name() } else { run.version_name.clone() };
                if same_project {
                    inner.versions.insert(Frame {
                        frame_id: new_id.clone(),
                        project_id: run.project_id.clone(),
                        name: Some(name.clone()),
                        design_code: Some(artifact.clone()),
                        created_on: OffsetDateTime::now_utc(),
                    })?;
                }
                if following {
                    inner.session.frame_id.clone_from(&new_id);
                    inner.session.messages.clone_from(&run.messages);
                    inner.history.reset_to(artifact.as_str());
                    self.publish(&artifact);
                }
                let version = NewVersion {
                    project_id: run.project_id.clone(),
                    frame_id: new_id.clone(),
                    name,
                    design_code: artifact.clone(),
                    messages: run.messages.clone(),
                };
                (Persist::Create(version), new_id, false, following)
            }
        };

        self.emit(StudioEvent::MessagesChanged);
        self.emit(StudioEvent::VersionsChanged);
        if switched {
            self.emit(StudioEvent::ActiveVersionChanged { frame_id: frame_id.clone() });
        }

        let persisted = match &persist {
            Persist::Upgrade(update) => self.projects.save_frame(update).await,
            Persist::Create(version) => self.projects.create_version(version).await,
        };
        if let Err(error) = persisted {
            warn!(%frame_id, %error, "saving generated version failed");
            self.notify(NoticeLevel::Error, NOTICE_SAVE_FAILED);
            return Err(GenerationError::Persist(error));
        }

        info!(%frame_id, upgraded, "generation complete");
        self.notify(NoticeLevel::Success, NOTICE_READY);
        Ok(GenerationOutcome::Code { frame_id, artifact, upgraded })
    }

    async fn fail(&self, run: &mut Run, error: ApiError) -> GenerationError {
        let shown = {
            let mut inner = self.inner.lock().await;
            if inner.follows(run) {
                self.publish(inner.history.current().unwrap_or_default());
            }
            self.set_run_tail(&mut inner, run, STATUS_FAILED)
        };
        if shown {
            self.emit(StudioEvent::MessagesChanged);
        }
        warn!(%error, code = error.error_code(), "generation failed");
        self.notify(NoticeLevel::Error, NOTICE_FAILED);
        GenerationError::Stream(error)
    }

    // --- Versions ---

    /// Open another persisted version and stop following the live stream.
    ///
    /// # Errors
    ///
    /// [`VersionError::NotFound`] / [`VersionError::NoCode`] for unknown or
    /// placeholder versions, or the collaborator's fetch failure.
    pub async fn switch_version(&self, frame_id: &str) -> Result<(), GenerationError> {
        let project_id = {
            let inner = self.inner.lock().await;
            let frame = inner
                .versions
                .get(frame_id)
                .ok_or_else(|| VersionError::NotFound(frame_id.to_owned()))?;
            if frame.is_placeholder() {
                return Err(VersionError::NoCode(frame_id.to_owned()).into());
            }
            inner.session.project_id.clone()
        };

        let detail = self.projects.frame(&project_id, frame_id).await?;

        {
            let mut inner = self.inner.lock().await;
            let stored = inner.versions.get(frame_id).and_then(|f| f.design_code.clone());
            let code = detail
                .design_code
                .filter(|code| !code.trim().is_empty())
                .or(stored)
                .map(|code| strip_fences(&code))
                .unwrap_or_default();
            inner.session.frame_id = frame_id.to_owned();
            inner.session.messages = detail.chat_messages;
            inner.following = false;
            self.publish(&code);
            inner.history.reset_to(code);
        }

        self.emit(StudioEvent::ActiveVersionChanged { frame_id: frame_id.to_owned() });
        self.emit(StudioEvent::MessagesChanged);
        info!(frame_id, "switched version");
        Ok(())
    }

    /// Delete a version. If it was active, the newest completed version
    /// takes its place.
    ///
    /// # Errors
    ///
    /// The collaborator's failure, or the follow-up switch's.
    pub async fn delete_version(&self, frame_id: &str) -> Result<(), GenerationError> {
        self.projects.delete_frame(frame_id).await?;

        let (was_active, next) = {
            let mut inner = self.inner.lock().await;
            inner.versions.remove(frame_id);
            let was_active = inner.session.frame_id == frame_id;
            let next = inner.versions.latest_completed().map(|f| f.frame_id.clone());
            if was_active && next.is_none() {
                inner.session.frame_id.clear();
                inner.session.messages.clear();
                inner.history.clear();
                self.publish("");
            }
            (was_active, next)
        };
        self.emit(StudioEvent::VersionsChanged);
        info!(frame_id, was_active, "version deleted");

        match next {
            Some(next) if was_active => self.switch_version(&next).await,
            None if was_active => {
                self.emit(StudioEvent::ActiveVersionChanged { frame_id: String::new() });
                Ok(())
            }
            _ => Ok(()),
        }
    }

    // --- History ---

    /// Step the active version's history back and publish the result.
    pub async fn undo(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let artifact = inner.history.undo()?.to_owned();
        self.publish(&artifact);
        Some(artifact)
    }

    /// Step forward again after an undo.
    pub async fn redo(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let artifact = inner.history.redo()?.to_owned();
        self.publish(&artifact);
        Some(artifact)
    }

    /// Record markup saved from the preview and persist it to the active
    /// version. Returns `false` when it matches the current artifact.
    ///
    /// The preview already shows the edit, so nothing is published.
    ///
    /// # Errors
    ///
    /// The collaborator's save failure.
    pub async fn record_edit(&self, markup: &str) -> Result<bool, GenerationError> {
        let markup = markup.trim();
        if markup.is_empty() {
            return Ok(false);
        }

        let update = {
            let mut inner = self.inner.lock().await;
            if !inner.history.push(markup) {
                return Ok(false);
            }
            let frame_id = inner.session.frame_id.clone();
            if inner.versions.contains(&frame_id) {
                inner.versions.overwrite_code(&frame_id, markup)?;
            }
            FrameUpdate {
                design_code: markup.to_owned(),
                frame_id,
                project_id: inner.session.project_id.clone(),
                name: None,
            }
        };

        if !is_fetchable_id(&update.frame_id) || !is_fetchable_id(&update.project_id) {
            debug!("no active version; edit kept locally");
            return Ok(true);
        }
        if let Err(error) = self.projects.save_frame(&update).await {
            warn!(frame_id = %update.frame_id, %error, "saving edit failed");
            self.notify(NoticeLevel::Error, NOTICE_SAVE_FAILED);
            return Err(error.into());
        }
        self.notify(NoticeLevel::Success, NOTICE_SAVED);
        Ok(true)
    }

    /// Re-publish the current artifact so the preview reloads it.
    pub async fn refresh_preview(&self) {
        let current = self.inner.lock().await.history.current().unwrap_or_default().to_owned();
        self.publish(&current);
        self.notify(NoticeLevel::Success, NOTICE_PREVIEW_REFRESHED);
    }

    // --- Chat ---

    /// Delete one persisted message.
    ///
    /// # Errors
    ///
    /// The collaborator's failure; the local chat is left unchanged.
    pub async fn delete_message(&self, message_id: i64) -> Result<(), GenerationError> {
        self.projects.delete_message(message_id).await?;
        {
            let mut inner = self.inner.lock().await;
            if inner.session.remove_message(message_id) {
                self.schedule_chat_save(&inner);
            }
        }
        self.emit(StudioEvent::MessagesChanged);
        self.notify(NoticeLevel::Success, NOTICE_MESSAGE_DELETED);
        Ok(())
    }

    /// Delete the active version's whole conversation. A chat save still
    /// waiting for its quiet period is dropped first, so it cannot write the
    /// old conversation back.
    ///
    /// # Errors
    ///
    /// The collaborator's failure; the local chat is left unchanged.
    pub async fn clear_chat(&self) -> Result<(), GenerationError> {
        let frame_id = self.inner.lock().await.session.frame_id.clone();
        if is_fetchable_id(&frame_id) {
            self.chat_sync.discard(&frame_id).await;
            self.projects.clear_chat(&frame_id).await?;
        }
        self.inner.lock().await.session.messages.clear();
        self.emit(StudioEvent::MessagesChanged);
        self.notify(NoticeLevel::Success, NOTICE_CHAT_CLEARED);
        Ok(())
    }

    // --- Private helpers ---

    fn gen_state(&self) -> MutexGuard<'_, GenerationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, artifact: &str) {
        self.artifact_tx.send_modify(|current| {
            artifact.clone_into(current);
        });
    }

    fn schedule_chat_save(&self, inner: &Inner) {
        let session = &inner.session;
        self.queue_chat(&session.project_id, &session.frame_id, &session.messages);
    }

    fn queue_chat(&self, project_id: &str, frame_id: &str, messages: &[Message]) {
        if messages.is_empty() || !is_fetchable_id(project_id) || !is_fetchable_id(frame_id) {
            return;
        }
        self.chat_sync.schedule(ChatSnapshot {
            messages: messages.to_vec(),
            frame_id: frame_id.to_owned(),
            project_id: project_id.to_owned(),
        });
    }

    /// Update the run's assistant message and queue its chat save. The
    /// session copy follows only while the run's version is open; returns
    /// whether it did.
    fn set_run_tail(&self, inner: &mut Inner, run: &mut Run, content: &str) -> bool {
        set_assistant_tail(&mut run.messages, content);
        self.queue_chat(&run.project_id, &run.frame_id, &run.messages);
        if !inner.shows(run) {
            return false;
        }
        inner.session.messages.clone_from(&run.messages);
        true
    }

    fn emit(&self, event: StudioEvent) {
        if self.events.send(event).is_err() {
            debug!("no event listener; event dropped");
        }
    }

    fn notify(&self, level: NoticeLevel, text: &str) {
        self.emit(StudioEvent::Notice { level, text: text.to_owned() });
    }
}

/// A random numeric frame id not yet used by `versions`.
fn fresh_frame_id(versions: &VersionList) -> String {
    let mut rng = rand::rng();
    loop {
        let id = rng.random_range(0..FRAME_ID_BOUND).to_string();
        if !versions.contains(&id) {
            return id;
        }
    }
}
