//! Chat sync: debounced background writes of the conversation.
//!
//! DESIGN
//! ======
//! Every message mutation hands a full snapshot to a background task. The
//! task keeps only the newest snapshot and writes it once no new snapshot has
//! arrived for the debounce period, so a burst of streamed edits costs one
//! `PUT /frames/chats`. A snapshot for a different frame first flushes the
//! pending one, since the two belong to different versions. Clearing a
//! conversation discards its pending snapshot so the cleared chat is not
//! written back.
//!
//! ERROR HANDLING
//! ==============
//! Failed writes are logged and dropped. The next mutation sends a newer full
//! snapshot, which supersedes anything lost.

#[cfg(test)]
#[path = "chat_sync_test.rs"]
mod chat_sync_test;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::net::{ChatSnapshot, ProjectApi};

enum Command {
    Schedule(ChatSnapshot),
    Flush(oneshot::Sender<()>),
    Discard { frame_id: String, ack: oneshot::Sender<()> },
}

enum Wake {
    Command(Option<Command>),
    QuietPeriod,
}

/// Handle to the background chat writer. Dropping it flushes and stops the task.
pub struct ChatSync {
    tx: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

impl ChatSync {
    /// Spawn the writer on the current runtime.
    #[must_use]
    pub fn spawn(api: Arc<dyn ProjectApi>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        info!(debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX), "chat sync started");
        let handle = tokio::spawn(run(api, debounce, rx));
        Self { tx, handle }
    }

    /// Queue a snapshot, restarting the quiet period.
    pub fn schedule(&self, snapshot: ChatSnapshot) {
        if self.tx.send(Command::Schedule(snapshot)).is_err() {
            warn!("chat sync task has stopped; snapshot dropped");
        }
    }

    /// Write any pending snapshot now and wait for it.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_err() {
            return;
        }
        if ack_rx.await.is_err() {
            debug!("chat sync stopped before acknowledging flush");
        }
    }

    /// Drop the pending snapshot for `frame_id`, if any, without writing it.
    /// Returns once the writer has processed the request.
    pub async fn discard(&self, frame_id: &str) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = Command::Discard { frame_id: frame_id.to_owned(), ack: ack_tx };
        if self.tx.send(command).is_err() {
            return;
        }
        if ack_rx.await.is_err() {
            debug!("chat sync stopped before acknowledging discard");
        }
    }

    /// Flush and wait for the task to exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(error) = self.handle.await {
            warn!(%error, "chat sync task failed");
        }
    }
}

async fn run(api: Arc<dyn ProjectApi>, debounce: Duration, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut pending: Option<ChatSnapshot> = None;

    loop {
        let wake = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => Wake::Command(command),
                () = tokio::time::sleep(debounce) => Wake::QuietPeriod,
            }
        } else {
            Wake::Command(rx.recv().await)
        };

        match wake {
            Wake::QuietPeriod => write(api.as_ref(), pending.take()).await,
            Wake::Command(Some(Command::Schedule(snapshot))) => {
                if pending.as_ref().is_some_and(|p| p.frame_id != snapshot.frame_id) {
                    write(api.as_ref(), pending.take()).await;
                }
                pending = Some(snapshot);
            }
            Wake::Command(Some(Command::Flush(ack))) => {
                write(api.as_ref(), pending.take()).await;
                if ack.send(()).is_err() {
                    debug!("flush requester went away");
                }
            }
            Wake::Command(Some(Command::Discard { frame_id, ack })) => {
                if pending.as_ref().is_some_and(|p| p.frame_id == frame_id) {
                    debug!(%frame_id, "pending chat snapshot discarded");
                    pending = None;
                }
                if ack.send(()).is_err() {
                    debug!("discard requester went away");
                }
            }
            Wake::Command(None) => {
                write(api.as_ref(), pending.take()).await;
                break;
            }
        }
    }
    debug!("chat sync stopped");
}

async fn write(api: &dyn ProjectApi, snapshot: Option<ChatSnapshot>) {
    let Some(snapshot) = snapshot else {
        return;
    };
    match api.save_chat(&snapshot).await {
        Ok(()) => debug!(frame_id = %snapshot.frame_id, messages = snapshot.messages.len(), "chat saved"),
        Err(error) => warn!(frame_id = %snapshot.frame_id, %error, "chat save failed"),
    }
}
