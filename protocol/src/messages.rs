//! Per-frame output formats the server writes to clients (spec §4.6).
//!
//! Nicknames and payload lines are raw byte strings (spec §3/§6), so
//! these build `Vec<u8>` rather than `String` — the server's own
//! announcement punctuation is ASCII, but the nick/text it wraps may not
//! be valid UTF-8.

pub fn join_announcement(nick: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nick.len() + 12);
    out.extend_from_slice(nick);
    out.extend_from_slice(b" has joined\n");
    out
}

pub fn leave_announcement(nick: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nick.len() + 10);
    out.extend_from_slice(nick);
    out.extend_from_slice(b" has left\n");
    out
}

pub fn user_line(nick: &[u8], text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nick.len() + text.len() + 3);
    out.extend_from_slice(nick);
    out.extend_from_slice(b": ");
    out.extend_from_slice(text);
    out.push(b'\n');
    out
}

pub const ERROR_LINE: &[u8] = b"ERROR\n";
