use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque reference to one connected peer (spec §3). Two handles
/// compare equal iff they were constructed from the same connection;
/// the writer is wrapped in its own mutex (mirroring the
/// `Arc<Mutex<SplitSink<..>>>` senders in the pack's WebSocket room
/// implementations) so the broadcaster of whichever room this client is
/// in can write to it without ever touching the connection's read side.
#[derive(Clone)]
pub struct ClientHandle {
    id: u64,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl ClientHandle {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn write(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientHandle {}

impl std::hash::Hash for ClientHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle").field("id", &self.id).finish()
    }
}
