use log::warn;
use tokio::sync::Mutex;

use crate::client_handle::ClientHandle;
use crate::member_list::MemberList;

/// A broadcast group (spec §3/§4.4): a name, a member list, and the
/// serializer that guards it. All member-list access happens through
/// `self.members.lock()`, which is the tokio (async-aware) mutex — the
/// broadcaster awaits a write per recipient while holding it, so it
/// cannot be a `std::sync::Mutex`.
pub struct Room {
    pub name: Vec<u8>,
    members: Mutex<MemberList>,
}

impl Room {
    /// `name` is a raw byte string (spec §3) — room names are not
    /// required to be valid UTF-8.
    pub fn new(name: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            members: Mutex::new(MemberList::new()),
        }
    }

    pub async fn add(&self, handle: ClientHandle) -> Result<(), crate::error::RoomError> {
        self.members.lock().await.add(handle)
    }

    /// Removes `handle`. Absence is an invariant violation per spec §7 —
    /// logged and otherwise ignored, never propagated to the caller.
    pub async fn remove(&self, handle: &ClientHandle) {
        if let Err(e) = self.members.lock().await.remove(handle) {
            warn!(
                "removing member from room '{}': {e}",
                String::from_utf8_lossy(&self.name)
            );
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    /// Tries to observe emptiness without suspending. Used by the
    /// directory's unmap path, which must not `.await` while holding its
    /// own (synchronous) lock.
    pub fn try_is_empty(&self) -> Option<bool> {
        self.members.try_lock().ok().map(|guard| guard.is_empty())
    }

    /// Writes `bytes` to every current member, in member-list order.
    /// A single recipient's write failure is logged and skipped — it
    /// must never stall or corrupt delivery to the rest (spec §4.4/P5).
    /// The failing recipient is not removed here: its own handler will
    /// observe the broken connection on its next read and deregister.
    pub async fn broadcast(&self, bytes: &[u8]) {
        let members = self.members.lock().await;

        for handle in members.iter() {
            if let Err(e) = handle.write(bytes).await {
                warn!(
                    "write to member of room '{}' failed: {e}",
                    String::from_utf8_lossy(&self.name)
                );
            }
        }
    }
}
