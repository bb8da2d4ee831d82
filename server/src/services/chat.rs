//! Chat service: per-room transcripts on disk.
//!
//! DESIGN
//! ======
//! Each room's transcript is a JSON array in `<CHAT_DIR>/<room>.json`. All
//! writes go through one background writer task fed by an unbounded queue,
//! so appends are never lost to interleaving and websocket handling never
//! waits on disk. `append` is fire-and-forget.
//!
//! `history` pushes a flush marker through the same queue and waits for it,
//! so a reader always sees every append queued before the call.
//!
//! Transcripts do not survive a restart: the writer empties the directory
//! before it processes anything.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use frames::{ChatMessage, MessageKind};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("transcript io: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcript json: {0}")]
    Json(#[from] serde_json::Error),
}

enum ChatCommand {
    Append { room_id: String, message: ChatMessage },
    Flush(oneshot::Sender<()>),
}

/// Handle to the transcript writer. Cheap to clone.
#[derive(Clone)]
pub struct ChatStore {
    tx: mpsc::UnboundedSender<ChatCommand>,
    dir: Arc<PathBuf>,
}

impl ChatStore {
    /// Start the writer task for `dir`. The directory is created if missing
    /// and emptied of existing transcripts.
    #[must_use]
    pub fn spawn(dir: PathBuf) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = Arc::new(dir);
        let handle = tokio::spawn(run_writer(Arc::clone(&dir), rx));
        (Self { tx, dir }, handle)
    }

    /// Queue `message` for `room_id`'s transcript.
    pub fn append(&self, room_id: &str, message: ChatMessage) {
        let cmd = ChatCommand::Append { room_id: room_id.to_owned(), message };
        if self.tx.send(cmd).is_err() {
            warn!(%room_id, "chat: writer stopped, message dropped");
        }
    }

    /// Every message stored for `room_id`, oldest first. Empty if the room
    /// has no transcript or it cannot be read.
    pub async fn history(&self, room_id: &str) -> Vec<ChatMessage> {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(ChatCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        match read_transcript(&transcript_path(&self.dir, room_id)).await {
            Ok(messages) => messages,
            Err(e) => {
                debug!(%room_id, error = %e, "chat: no readable transcript");
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

/// A server-authored notice about `username`, such as "ann joined the chat".
#[must_use]
pub fn system_message(room_id: &str, username: &str, text: String) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4().to_string(),
        room_id: Some(room_id.to_owned()),
        text,
        username: username.to_owned(),
        time: now_ms(),
        kind: MessageKind::System,
    }
}

// =============================================================================
// WRITER
// =============================================================================

async fn run_writer(dir: Arc<PathBuf>, mut rx: mpsc::UnboundedReceiver<ChatCommand>) {
    match clear_transcripts(&dir).await {
        Ok(removed) => info!(dir = %dir.display(), removed, "chat: transcripts cleared"),
        Err(e) => warn!(dir = %dir.display(), error = %e, "chat: could not prepare transcript dir"),
    }

    while let Some(cmd) = rx.recv().await {
        match cmd {
            ChatCommand::Append { room_id, message } => {
                let path = transcript_path(&dir, &room_id);
                if let Err(e) = append_message(&path, message).await {
                    warn!(%room_id, error = %e, "chat: append failed");
                }
            }
            ChatCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Create `dir` if needed and delete every `.json` file in it.
async fn clear_transcripts(dir: &Path) -> Result<usize, ChatError> {
    tokio::fs::create_dir_all(dir).await?;
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            tokio::fs::remove_file(&path).await?;
            removed += 1;
        }
    }
    Ok(removed)
}

async fn read_transcript(path: &Path) -> Result<Vec<ChatMessage>, ChatError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn append_message(path: &Path, message: ChatMessage) -> Result<(), ChatError> {
    let mut messages = match read_transcript(path).await {
        Ok(messages) => messages,
        Err(ChatError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    messages.push(message);
    tokio::fs::write(path, serde_json::to_vec(&messages)?).await?;
    Ok(())
}

/// Transcript file for `room_id`. Bytes outside `[A-Za-z0-9-]` become
/// `_xx` (lowercase hex), so a room id can never escape the directory and
/// distinct ids never share a file.
#[must_use]
pub fn transcript_path(dir: &Path, room_id: &str) -> PathBuf {
    let mut safe = String::with_capacity(room_id.len());
    for b in room_id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            safe.push(char::from(b));
        } else {
            safe.push_str(&format!("_{b:02x}"));
        }
    }
    dir.join(format!("{safe}.json"))
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
