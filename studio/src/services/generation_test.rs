use super::*;
use crate::net::mock::{Call, MockModel, MockProjects, Script, sse};
use frames::{FrameDetail, Project};
use time::macros::datetime;

// =========================================================================
// Fixtures
// =========================================================================

struct Harness {
    orch: Orchestrator,
    projects: Arc<MockProjects>,
    model: Arc<MockModel>,
    events: mpsc::UnboundedReceiver<StudioEvent>,
}

fn harness(projects: MockProjects, scripts: Vec<Script>) -> Harness {
    let projects = Arc::new(projects);
    let model = Arc::new(MockModel::new(scripts));
    let (tx, events) = mpsc::unbounded_channel();
    let orch = Orchestrator::new(projects.clone(), model.clone(), StudioConfig::default(), tx);
    Harness { orch, projects, model, events }
}

fn frame(id: &str, code: Option<&str>, day: i64) -> Frame {
    Frame {
        frame_id: id.into(),
        project_id: "p1".into(),
        name: code.map(|_| format!("Version {day}")),
        design_code: code.map(str::to_owned),
        created_on: datetime!(2025-01-01 0:00 UTC) + time::Duration::days(day),
    }
}

fn detail(id: &str, code: Option<&str>, messages: Vec<Message>) -> FrameDetail {
    FrameDetail {
        frame_id: id.into(),
        project_id: "p1".into(),
        design_code: code.map(str::to_owned),
        chat_messages: messages,
    }
}

fn project(frames: Vec<Frame>) -> Project {
    Project { project_id: "p1".into(), description: Some("Neighborhood bakery".into()), frames }
}

/// Project with one completed version "10" and a finished conversation.
fn completed_project() -> MockProjects {
    MockProjects::new()
        .with_project(project(vec![frame("10", Some("<p>v1</p>"), 1)]))
        .with_frame(detail(
            "10",
            Some("```html\n<p>v1</p>\n```"),
            vec![Message::user("a bakery page"), Message::assistant(STATUS_READY)],
        ))
}

fn notices(events: &mut mpsc::UnboundedReceiver<StudioEvent>) -> Vec<(NoticeLevel, String)> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StudioEvent::Notice { level, text } = event {
            out.push((level, text));
        }
    }
    out
}

fn version_writes(calls: &[Call]) -> Vec<Call> {
    calls
        .iter()
        .filter(|c| matches!(c, Call::SaveFrame(_) | Call::CreateVersion(_)))
        .cloned()
        .collect()
}

// =========================================================================
// Latch
// =========================================================================

#[test]
fn generation_state_latch_and_resume_flag() {
    let mut state = GenerationState::default();
    assert!(state.try_begin());
    assert!(!state.try_begin());
    state.finish(false);
    assert_eq!(state.phase(), Phase::Error);
    assert!(state.try_begin());
    state.finish(true);
    assert_eq!(state.phase(), Phase::Idle);

    assert!(state.claim_auto_resume());
    assert!(!state.claim_auto_resume());
}

#[tokio::test]
async fn overlapping_generations_make_one_request() {
    let h = harness(completed_project(), vec![sse(&["```html\n<div>v2", "</div>\n```"])]);
    h.orch.load_session("p1", "10").await.unwrap();

    let (first, second) = tokio::join!(h.orch.generate("add a menu", false), h.orch.generate("add a menu", false));

    assert!(matches!(first.unwrap(), GenerationOutcome::Code { upgraded: false, .. }));
    assert_eq!(second.unwrap(), GenerationOutcome::Rejected);
    assert_eq!(h.model.request_count(), 1);
    assert_eq!(h.orch.phase(), Phase::Idle);

    let session = h.orch.session().await;
    let users = session.messages.iter().filter(|m| m.role == Role::User).count();
    assert_eq!(users, 2);
}

#[tokio::test]
async fn blank_prompt_is_refused() {
    let h = harness(MockProjects::new(), vec![]);
    assert!(matches!(h.orch.generate("   ", false).await, Err(GenerationError::EmptyPrompt)));
    assert_eq!(h.model.request_count(), 0);
}

// =========================================================================
// Completion modes
// =========================================================================

#[tokio::test]
async fn component_response_creates_and_follows_new_version() {
    let mut h = harness(
        completed_project(),
        vec![sse(&["Here you go:\n", "```ht", "ml\n<form>", "<input name=\"email\">", "</form>\n``", "`\nEnjoy"])],
    );
    let preview = h.orch.subscribe();
    h.orch.load_session("p1", "10").await.unwrap();
    assert_eq!(*preview.borrow(), "<p>v1</p>");

    let outcome = h.orch.generate("a signup form", false).await.unwrap();
    let GenerationOutcome::Code { frame_id, artifact, upgraded } = outcome else {
        panic!("expected code outcome");
    };
    assert!(!upgraded);
    assert_ne!(frame_id, "10");
    assert_eq!(artifact, "<form><input name=\"email\"></form>");
    assert_eq!(*preview.borrow(), artifact);

    let session = h.orch.session().await;
    assert_eq!(session.frame_id, frame_id);
    assert_eq!(session.messages.last().map(|m| m.content.as_str()), Some(STATUS_READY));
    assert_eq!(h.orch.current_artifact().await.as_deref(), Some(artifact.as_str()));

    let versions = h.orch.versions().await;
    assert_eq!(versions.len(), 2);
    assert_eq!(versions.get(&frame_id).and_then(|f| f.name.as_deref()), Some("Version 2"));

    let writes = version_writes(&h.projects.calls());
    let [Call::CreateVersion(created)] = writes.as_slice() else {
        panic!("expected one version write, got {writes:?}");
    };
    assert_eq!(created.frame_id, frame_id);
    assert_eq!(created.name, "Version 2");
    assert_eq!(created.design_code, artifact);

    assert_eq!(notices(&mut h.events), vec![(NoticeLevel::Success, NOTICE_READY.to_owned())]);

    let prompt = h.model.prompts.lock().unwrap()[0].clone();
    assert!(prompt.starts_with("User Request: a signup form\nProject Context: Neighborhood bakery\n"));
    assert!(prompt.contains("User: a bakery page"));
}

#[tokio::test]
async fn conversational_response_creates_no_version() {
    let h = harness(completed_project(), vec![sse(&["A hero section is ", "the first screen visitors see."])]);
    h.orch.load_session("p1", "10").await.unwrap();

    let outcome = h.orch.generate("what is a hero section?", false).await.unwrap();
    let text = "A hero section is the first screen visitors see.";
    assert_eq!(outcome, GenerationOutcome::Conversation { text: text.into() });

    let session = h.orch.session().await;
    assert_eq!(session.messages.last().map(|m| m.content.as_str()), Some(text));
    assert_eq!(session.frame_id, "10");
    assert!(version_writes(&h.projects.calls()).is_empty());
    assert_eq!(h.orch.versions().await.len(), 1);
    assert_eq!(h.orch.current_artifact().await.as_deref(), Some("<p>v1</p>"));
}

#[tokio::test]
async fn malformed_records_are_skipped() {
    let mut chunks = vec![Ok(b"data: {not json}\n\n".to_vec()), Ok(b": keep-alive\n".to_vec())];
    chunks.extend(sse(&["```html<b>ok</b>```"]).unwrap());
    let h = harness(completed_project(), vec![Ok(chunks)]);
    h.orch.load_session("p1", "10").await.unwrap();

    let outcome = h.orch.generate("bold text", false).await.unwrap();
    assert!(matches!(outcome, GenerationOutcome::Code { artifact, .. } if artifact == "<b>ok</b>"));
}

// =========================================================================
// Auto-resume
// =========================================================================

fn placeholder_project() -> MockProjects {
    MockProjects::new()
        .with_project(project(vec![frame("10", None, 1)]))
        .with_frame(detail("10", None, vec![Message::user("bakery landing page")]))
}

#[tokio::test]
async fn auto_resume_upgrades_placeholder_in_place() {
    let h = harness(placeholder_project(), vec![sse(&["```html\n<main>Bakery</main>\n```"])]);

    let outcome = h.orch.load_session("p1", "10").await.unwrap();
    assert_eq!(
        outcome,
        Some(GenerationOutcome::Code { frame_id: "10".into(), artifact: "<main>Bakery</main>".into(), upgraded: true })
    );

    let writes = version_writes(&h.projects.calls());
    assert_eq!(
        writes,
        vec![Call::SaveFrame(FrameUpdate {
            design_code: "<main>Bakery</main>".into(),
            frame_id: "10".into(),
            project_id: "p1".into(),
            name: Some("Version 1".into()),
        })]
    );

    let session = h.orch.session().await;
    assert_eq!(session.frame_id, "10");
    assert_eq!(session.messages.len(), 2, "prompt must not be appended twice");
    let versions = h.orch.versions().await;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions.get("10").and_then(|f| f.design_code.as_deref()), Some("<main>Bakery</main>"));

    assert!(h.model.prompts.lock().unwrap()[0].starts_with("User Request: bakery landing page\n"));
}

#[tokio::test]
async fn auto_resume_runs_once_per_session() {
    let h = harness(placeholder_project(), vec![Err(ApiError::Request("connection reset".into()))]);

    assert!(matches!(h.orch.load_session("p1", "10").await, Err(GenerationError::Stream(_))));
    assert_eq!(h.orch.load_session("p1", "10").await.unwrap(), None);
    assert_eq!(h.model.request_count(), 1);
}

#[tokio::test]
async fn unset_ids_skip_fetches() {
    let h = harness(MockProjects::new(), vec![]);
    assert_eq!(h.orch.load_session("undefined", "").await.unwrap(), None);
    assert!(h.projects.calls().is_empty());
}

// =========================================================================
// Failures
// =========================================================================

#[tokio::test]
async fn transport_failure_rolls_back_to_apology() {
    let broken: Script = Ok(vec![
        Ok(frames::stream::encode_delta("```html<div>").into_bytes()),
        Err(ApiError::Request("stream reset".into())),
    ]);
    let mut h = harness(completed_project(), vec![broken, sse(&["fine now"])]);
    let preview = h.orch.subscribe();
    h.orch.load_session("p1", "10").await.unwrap();
    notices(&mut h.events);

    let err = h.orch.generate("add a footer", false).await.unwrap_err();
    assert!(matches!(err, GenerationError::Stream(_)));
    assert_eq!(err.error_code(), "E_GENERATION_STREAM");
    assert!(err.retryable());
    assert_eq!(h.orch.phase(), Phase::Error);

    let session = h.orch.session().await;
    assert_eq!(session.messages.last().map(|m| m.content.as_str()), Some(STATUS_FAILED));
    assert!(version_writes(&h.projects.calls()).is_empty());
    assert_eq!(notices(&mut h.events), vec![(NoticeLevel::Error, NOTICE_FAILED.to_owned())]);
    assert_eq!(*preview.borrow(), "<p>v1</p>", "partial artifact must not outlive the failure");

    assert!(h.orch.generate("try again", false).await.is_ok());
    assert_eq!(h.orch.phase(), Phase::Idle);
}

#[tokio::test]
async fn failed_version_save_is_reported() {
    let mut h = harness(completed_project(), vec![sse(&["```html<p>v2</p>```"])]);
    h.orch.load_session("p1", "10").await.unwrap();
    *h.projects.fail_writes.lock().unwrap() = true;
    notices(&mut h.events);

    let err = h.orch.generate("v2", false).await.unwrap_err();
    assert!(matches!(err, GenerationError::Persist(_)));
    assert_eq!(notices(&mut h.events), vec![(NoticeLevel::Error, NOTICE_SAVE_FAILED.to_owned())]);
}

// =========================================================================
// Versions and history
// =========================================================================

fn two_version_project() -> MockProjects {
    MockProjects::new()
        .with_project(project(vec![frame("10", Some("<p>v1</p>"), 1), frame("20", Some("<p>v2</p>"), 2)]))
        .with_frame(detail("10", Some("<p>v1</p>"), vec![Message::user("first")]))
        .with_frame(detail("20", Some("<p>v2</p>"), vec![Message::user("second")]))
}

#[tokio::test]
async fn switching_mid_generation_keeps_the_chosen_version() {
    let h = harness(two_version_project(), vec![sse(&["```html<p>v3</p>```"])]);
    let preview = h.orch.subscribe();
    h.orch.load_session("p1", "20").await.unwrap();

    let (generated, switched) = tokio::join!(h.orch.generate("v3", false), h.orch.switch_version("10"));
    switched.unwrap();
    let GenerationOutcome::Code { frame_id, .. } = generated.unwrap() else {
        panic!("expected code outcome");
    };

    let session = h.orch.session().await;
    assert_eq!(session.frame_id, "10");
    assert_eq!(session.messages, vec![Message::user("first")]);
    assert_eq!(*preview.borrow(), "<p>v1</p>");
    assert!(h.orch.versions().await.contains(&frame_id));

    let produced = vec![Message::user("second"), Message::user("v3"), Message::assistant(STATUS_READY)];
    let writes = version_writes(&h.projects.calls());
    let [Call::CreateVersion(created)] = writes.as_slice() else {
        panic!("expected one version write, got {writes:?}");
    };
    assert_eq!(created.messages, produced);

    h.orch.flush_chat().await;
    let saves = h.projects.chat_saves();
    assert!(saves.iter().all(|s| s.frame_id == "20"), "chat written to the wrong version: {saves:?}");
    assert_eq!(saves.last().map(|s| s.messages.clone()), Some(produced));
}

#[tokio::test]
async fn reloading_mid_generation_keeps_chats_apart() {
    let h = harness(two_version_project(), vec![sse(&["```html<p>v3</p>```"])]);
    h.orch.load_session("p1", "20").await.unwrap();

    let (generated, loaded) = tokio::join!(h.orch.generate("v3", false), h.orch.load_session("p1", "10"));
    assert_eq!(loaded.unwrap(), None);
    let GenerationOutcome::Code { frame_id, upgraded: false, .. } = generated.unwrap() else {
        panic!("expected a new version");
    };

    let session = h.orch.session().await;
    assert_eq!(session.frame_id, "10");
    assert_eq!(session.messages, vec![Message::user("first")]);
    assert_eq!(h.orch.current_artifact().await.as_deref(), Some("<p>v1</p>"));
    assert!(h.orch.versions().await.contains(&frame_id));

    h.orch.flush_chat().await;
    let saves = h.projects.chat_saves();
    assert!(saves.iter().all(|s| s.frame_id == "20"), "chat written to the wrong version: {saves:?}");
    assert_eq!(
        saves.last().and_then(|s| s.messages.last()).map(|m| m.content.as_str()),
        Some(STATUS_READY)
    );
}

#[tokio::test]
async fn switch_version_isolates_history() {
    let h = harness(two_version_project(), vec![]);
    h.orch.load_session("p1", "20").await.unwrap();
    h.orch.record_edit("<p>v2 edited</p>").await.unwrap();
    assert!(h.orch.can_undo().await);

    h.orch.switch_version("10").await.unwrap();
    assert!(!h.orch.can_undo().await);
    assert_eq!(h.orch.current_artifact().await.as_deref(), Some("<p>v1</p>"));
    assert_eq!(h.orch.session().await.messages, vec![Message::user("first")]);

    assert!(matches!(
        h.orch.switch_version("99").await,
        Err(GenerationError::Version(VersionError::NotFound(_)))
    ));
}

#[tokio::test]
async fn record_edit_persists_and_supports_undo() {
    let mut h = harness(completed_project(), vec![]);
    let mut preview = h.orch.subscribe();
    h.orch.load_session("p1", "10").await.unwrap();
    notices(&mut h.events);

    assert!(h.orch.record_edit("<p>edited</p>").await.unwrap());
    assert!(!h.orch.record_edit("<p>edited</p>").await.unwrap());
    assert_eq!(
        version_writes(&h.projects.calls()),
        vec![Call::SaveFrame(FrameUpdate {
            design_code: "<p>edited</p>".into(),
            frame_id: "10".into(),
            project_id: "p1".into(),
            name: None,
        })]
    );
    assert_eq!(notices(&mut h.events), vec![(NoticeLevel::Success, NOTICE_SAVED.to_owned())]);

    assert_eq!(h.orch.undo().await.as_deref(), Some("<p>v1</p>"));
    assert_eq!(*preview.borrow_and_update(), "<p>v1</p>");
    assert_eq!(h.orch.undo().await, None);
    assert_eq!(h.orch.redo().await.as_deref(), Some("<p>edited</p>"));
}

#[tokio::test]
async fn deleting_active_version_falls_back_to_latest_completed() {
    let h = harness(two_version_project(), vec![]);
    h.orch.load_session("p1", "20").await.unwrap();

    h.orch.delete_version("20").await.unwrap();
    assert!(h.projects.calls().contains(&Call::DeleteFrame("20".into())));
    assert_eq!(h.orch.session().await.frame_id, "10");
    assert_eq!(h.orch.current_artifact().await.as_deref(), Some("<p>v1</p>"));

    h.orch.delete_version("10").await.unwrap();
    assert_eq!(h.orch.session().await.frame_id, "");
    assert_eq!(h.orch.current_artifact().await, None);
}

#[tokio::test]
async fn refresh_republishes_current_artifact() {
    let h = harness(completed_project(), vec![]);
    let mut preview = h.orch.subscribe();
    h.orch.load_session("p1", "10").await.unwrap();
    preview.mark_unchanged();

    h.orch.refresh_preview().await;
    assert!(preview.has_changed().unwrap());
    assert_eq!(*preview.borrow(), "<p>v1</p>");
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn delete_message_and_clear_chat() {
    let projects = MockProjects::new()
        .with_project(project(vec![frame("10", Some("<p>v1</p>"), 1)]))
        .with_frame(detail(
            "10",
            Some("<p>v1</p>"),
            vec![Message { id: Some(1), ..Message::user("a") }, Message { id: Some(2), ..Message::assistant("b") }],
        ));
    let h = harness(projects, vec![]);
    h.orch.load_session("p1", "10").await.unwrap();

    h.orch.delete_message(1).await.unwrap();
    assert_eq!(h.orch.session().await.messages.len(), 1);
    h.orch.clear_chat().await.unwrap();
    assert!(h.orch.session().await.messages.is_empty());

    let calls = h.projects.calls();
    assert!(calls.contains(&Call::DeleteMessage(1)));
    assert!(calls.contains(&Call::ClearChat("10".into())));
}

#[tokio::test(start_paused = true)]
async fn streamed_chat_is_saved_once_after_quiet_period() {
    let h = harness(completed_project(), vec![sse(&["Sure", ", ", "happy ", "to ", "help."])]);
    h.orch.load_session("p1", "10").await.unwrap();
    h.orch.generate("hello", false).await.unwrap();
    assert!(h.projects.chat_saves().is_empty());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let saves = h.projects.chat_saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].messages.last().map(|m| m.content.as_str()), Some("Sure, happy to help."));
}

#[tokio::test(start_paused = true)]
async fn clearing_chat_drops_the_pending_save() {
    let h = harness(completed_project(), vec![sse(&["Sure."])]);
    h.orch.load_session("p1", "10").await.unwrap();
    h.orch.generate("hello", false).await.unwrap();

    h.orch.clear_chat().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert!(h.projects.calls().contains(&Call::ClearChat("10".into())));
    assert!(h.projects.chat_saves().is_empty(), "cleared chat was written back");
    assert!(h.orch.session().await.messages.is_empty());
}

#[tokio::test]
async fn start_project_posts_placeholder_with_prompt() {
    let h = harness(MockProjects::new(), vec![]);
    let (project_id, frame_id) = h.orch.start_project("  a portfolio site ").await.unwrap();

    assert!(Uuid::parse_str(&project_id).is_ok());
    assert!(frame_id.parse::<u32>().unwrap() < FRAME_ID_BOUND);
    assert_eq!(
        h.projects.calls(),
        vec![Call::CreateProject(NewProject { project_id, frame_id, messages: vec![Message::user("a portfolio site")] })]
    );
}
