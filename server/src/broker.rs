use std::sync::Arc;

use crate::client_handle::ClientHandle;
use crate::directory::RoomDirectory;
use crate::error::RoomError;
use crate::room::Room;

/// The process-wide broker (spec §9's redesign flag): an explicit value
/// constructed at startup and threaded through every connection handler,
/// replacing the reference implementation's file-scope globals
/// (`trie_lock`/`trie_root`). Owning no sockets of its own, it is
/// trivially unit-testable by instantiating independent brokers.
#[derive(Default)]
pub struct Broker {
    directory: RoomDirectory,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            directory: RoomDirectory::new(),
        }
    }

    /// Looks up or lazily creates `room_name`'s room, then adds `handle`
    /// to it. Takes D, obtains/creates R, releases D, then takes R to
    /// add — the join-path ordering spec §4.5 requires. If the add
    /// fails, a freshly-created room would otherwise be left mapped with
    /// zero members, violating I1 — roll it back through the same
    /// empty-room unmap path `leave` uses.
    pub async fn join(
        &self,
        room_name: &[u8],
        handle: ClientHandle,
    ) -> Result<Arc<Room>, RoomError> {
        let room = self.directory.get_or_create(room_name);

        if let Err(e) = room.add(handle).await {
            self.directory.remove_if_empty(room_name, &room);
            return Err(e);
        }

        Ok(room)
    }

    /// Removes `handle` from `room`, then unmaps the room from the
    /// directory iff it is now empty — per spec §4.5's rule, this
    /// releases R before ever touching D, and re-checks emptiness after
    /// reacquiring D+R so a racing joiner is never lost.
    pub async fn leave(&self, room_name: &[u8], room: &Arc<Room>, handle: &ClientHandle) {
        room.remove(handle).await;

        if !room.is_empty().await {
            return;
        }

        // Room looked empty the instant we released R. Reacquire D, then
        // R (via the non-suspending try_is_empty inside remove_if_empty)
        // and only unmap if it is still empty under that combined view.
        loop {
            if self.directory.remove_if_empty(room_name, room) {
                return;
            }

            if !room.is_empty().await {
                return; // someone joined in the interval; room stays
            }
            // Still empty but remove_if_empty lost a race against a
            // concurrent mutator's brief hold of the room lock — retry.
        }
    }
}
