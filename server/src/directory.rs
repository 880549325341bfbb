use std::sync::{Arc, Mutex};

use crate::room::Room;

/// One edge per possible byte value. The reference C trie
/// (`utils.c::TrieNode`) is 128-ary and indexes with `toascii()`, which
/// silently folds any byte >= 0x80 into the low 7 bits. Room/nick names
/// here are only required to avoid space and newline (spec §3), so a
/// name containing a multi-byte UTF-8 character would collide under
/// that folding. This trie widens the fan-out to 256 to index every
/// byte value exactly, which is the direct, panic-free generalization
/// of the same structure rather than a behavior change.
const TRIE_FANOUT: usize = 256;

struct TrieNode {
    children: [Option<Box<TrieNode>>; TRIE_FANOUT],
    room: Option<Arc<Room>>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: std::array::from_fn(|_| None),
            room: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }

    fn find(&self, bytes: &[u8]) -> Option<&TrieNode> {
        let mut node = self;
        for &b in bytes {
            node = node.children[b as usize].as_deref()?;
        }
        Some(node)
    }

    fn find_mut(&mut self, bytes: &[u8]) -> Option<&mut TrieNode> {
        let mut node = self;
        for &b in bytes {
            node = node.children[b as usize].as_deref_mut()?;
        }
        Some(node)
    }

    fn get_or_create(&mut self, name: &[u8]) -> Arc<Room> {
        let mut node = self;
        for &b in name {
            node = node.children[b as usize].get_or_insert_with(|| Box::new(TrieNode::new()));
        }

        if let Some(room) = &node.room {
            return room.clone();
        }

        let room = Arc::new(Room::new(name));
        node.room = Some(room.clone());
        room
    }

    /// Prunes the path to `bytes` back to the first still-branching (or
    /// still-a-room) ancestor, mirroring `remove_from_trie` in utils.c.
    /// Must only be called after the terminal node's `room` has already
    /// been cleared. Failing to prune is a memory leak, not a
    /// correctness bug (spec §9).
    fn prune(&mut self, bytes: &[u8]) {
        prune_rec(self, bytes, 0);
    }
}

fn prune_rec(node: &mut TrieNode, bytes: &[u8], i: usize) -> bool {
    let idx = bytes[i] as usize;

    if i == bytes.len() - 1 {
        let delete = matches!(&node.children[idx], Some(child) if child.room.is_none() && child.is_leaf());
        if delete {
            node.children[idx] = None;
            return true;
        }
        return false;
    }

    let should_delete_child = match node.children[idx].as_deref_mut() {
        Some(child) => prune_rec(child, bytes, i + 1),
        None => return false,
    };

    if should_delete_child {
        let child_is_dead = matches!(
            node.children[idx].as_deref(),
            Some(child) if child.room.is_none() && child.is_leaf()
        );
        if child_is_dead {
            node.children[idx] = None;
            return true;
        }
    }

    false
}

/// Name → room mapping with concurrent lookup, get-or-create, and
/// deletion (spec §4.5). All traversal here is synchronous — no I/O, no
/// `.await` — so a plain `std::sync::Mutex` is sufficient and, per the
/// locking discipline, is never held while awaiting a room's lock.
pub struct RoomDirectory {
    root: Mutex<TrieNode>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(TrieNode::new()),
        }
    }

    pub fn lookup(&self, name: &[u8]) -> Option<Arc<Room>> {
        let root = self.root.lock().unwrap();
        root.find(name).and_then(|n| n.room.clone())
    }

    pub fn get_or_create(&self, name: &[u8]) -> Arc<Room> {
        let mut root = self.root.lock().unwrap();
        root.get_or_create(name)
    }

    /// Unmaps `room` from `name` iff it is still the room stored there
    /// and it is still empty. Uses `Room::try_is_empty` (non-suspending)
    /// so the directory lock is never held across an `.await` — the
    /// "never acquire D while holding R [across a suspend point]" rule
    /// from spec §4.5.
    pub fn remove_if_empty(&self, name: &[u8], room: &Arc<Room>) -> bool {
        let mut root = self.root.lock().unwrap();

        let Some(node) = root.find_mut(name) else {
            return false;
        };

        let still_this_room = matches!(&node.room, Some(r) if Arc::ptr_eq(r, room));
        if !still_this_room {
            return false;
        }

        match room.try_is_empty() {
            Some(true) => {
                node.room = None;
                root.prune(name);
                true
            }
            _ => false,
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
