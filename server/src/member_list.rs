use std::collections::HashSet;

use crate::client_handle::ClientHandle;
use crate::error::RoomError;

/// Initial capacity the reference implementation's resizable array
/// starts at before doubling (`INIT_ARR_CAP` in utils.c).
const INITIAL_CAPACITY: usize = 1000;

/// The member list a room owns (spec §4.3). Backed by a `Vec` that
/// doubles like the original `rs_array_t`, plus an auxiliary id set for
/// O(1) duplicate rejection.
///
/// The source's `insert_into_rs_array` checks `data[size-1] == user_fd`
/// even when `size == 0`, an out-of-bounds read (spec §9's flagged
/// ambiguity). The auxiliary set sidesteps that bug entirely: presence
/// is a hash lookup, not an index into a possibly-empty array.
#[derive(Default)]
pub struct MemberList {
    handles: Vec<ClientHandle>,
    ids: HashSet<u64>,
}

impl MemberList {
    pub fn new() -> Self {
        Self {
            handles: Vec::with_capacity(INITIAL_CAPACITY),
            ids: HashSet::new(),
        }
    }

    pub fn add(&mut self, handle: ClientHandle) -> Result<(), RoomError> {
        if !self.ids.insert(handle.id()) {
            return Err(RoomError::AlreadyPresent);
        }

        if self.handles.len() == self.handles.capacity() {
            self.handles.reserve(self.handles.capacity().max(1));
        }

        self.handles.push(handle);
        Ok(())
    }

    pub fn remove(&mut self, handle: &ClientHandle) -> Result<(), RoomError> {
        let pos = self
            .handles
            .iter()
            .position(|h| h.id() == handle.id())
            .ok_or(RoomError::NotPresent)?;

        self.handles.remove(pos);
        self.ids.remove(&handle.id());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
