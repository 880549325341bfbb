pub mod error;
pub mod frame;
pub mod join;
pub mod messages;

pub const DEFAULT_PORT: u16 = 1234;

/// Bound on a single frame, scratch buffer included. A frame without a
/// newline inside this many bytes is rejected (spec §4.1).
pub const MAX_FRAME: usize = 20000;

/// Room and nick names are 1..=20 bytes, no space, no newline (spec §4.2).
/// Names are raw byte strings, not necessarily UTF-8 (spec §3/§6).
pub const MAX_NAME_LENGTH: usize = 20;

pub fn is_valid_name(name: &[u8]) -> bool {
    let len = name.len();
    len >= 1 && len <= MAX_NAME_LENGTH && !name.contains(&b' ') && !name.contains(&b'\n')
}
