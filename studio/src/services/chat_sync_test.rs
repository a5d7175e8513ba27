use super::*;
use crate::net::mock::{Call, MockProjects};
use frames::Message;

const DEBOUNCE: Duration = Duration::from_millis(2000);

fn snapshot(frame_id: &str, texts: &[&str]) -> ChatSnapshot {
    ChatSnapshot {
        messages: texts.iter().map(|t| Message::user(*t)).collect(),
        frame_id: frame_id.into(),
        project_id: "p1".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_mutations_collapse_into_one_write() {
    let api = Arc::new(MockProjects::new());
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    for n in 1..=5 {
        let texts: Vec<String> = (1..=n).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        sync.schedule(snapshot("10", &refs));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(api.chat_saves().is_empty());

    tokio::time::sleep(DEBOUNCE + Duration::from_millis(100)).await;
    let saves = api.chat_saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].messages.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn quiet_period_restarts_on_each_mutation() {
    let api = Arc::new(MockProjects::new());
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    sync.schedule(snapshot("10", &["a"]));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    sync.schedule(snapshot("10", &["a", "b"]));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(api.chat_saves().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(api.chat_saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_frames_flushes_the_pending_snapshot() {
    let api = Arc::new(MockProjects::new());
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    sync.schedule(snapshot("10", &["old"]));
    sync.schedule(snapshot("20", &["new"]));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let saves = api.chat_saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].frame_id, "10");

    sync.flush().await;
    let frames: Vec<_> = api.chat_saves().into_iter().map(|s| s.frame_id).collect();
    assert_eq!(frames, ["10", "20"]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_writes_pending_snapshot() {
    let api = Arc::new(MockProjects::new());
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    sync.schedule(snapshot("10", &["last words"]));
    sync.shutdown().await;
    assert_eq!(api.calls(), vec![Call::SaveChat(snapshot("10", &["last words"]))]);
}

#[tokio::test(start_paused = true)]
async fn failed_write_is_dropped() {
    let api = Arc::new(MockProjects::new());
    *api.fail_writes.lock().unwrap() = true;
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    sync.schedule(snapshot("10", &["a"]));
    sync.flush().await;
    sync.flush().await;
    assert_eq!(api.chat_saves().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn discard_drops_pending_snapshot_for_that_frame_only() {
    let api = Arc::new(MockProjects::new());
    let sync = ChatSync::spawn(api.clone(), DEBOUNCE);

    sync.schedule(snapshot("10", &["stale"]));
    sync.discard("20").await;
    sync.discard("10").await;
    tokio::time::sleep(DEBOUNCE * 2).await;
    assert!(api.chat_saves().is_empty());

    sync.schedule(snapshot("20", &["kept"]));
    sync.discard("10").await;
    sync.flush().await;
    assert_eq!(api.chat_saves(), vec![snapshot("20", &["kept"])]);
}
