use crate::error::ProtocolError;
use crate::is_valid_name;

/// A parsed `JOIN <room> <nick>` handshake (spec §4.2). `room`/`nick` are
/// raw byte strings — the wire protocol is byte-transparent except for
/// space/newline as delimiters (spec §6), so neither is required to be
/// valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCommand {
    pub room: Vec<u8>,
    pub nick: Vec<u8>,
}

impl JoinCommand {
    /// Parses the first frame of a connection. `frame` must already have
    /// its trailing newline stripped.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let fields: Vec<&[u8]> = frame.split(|&b| b == b' ').collect();
        let [keyword, room, nick] = fields.as_slice() else {
            return Err(ProtocolError::MalformedJoin("expected exactly three tokens"));
        };

        if !keyword.eq_ignore_ascii_case(b"join") {
            return Err(ProtocolError::MalformedJoin("expected JOIN keyword"));
        }

        if !is_valid_name(room) {
            return Err(ProtocolError::MalformedJoin("invalid room name"));
        }

        if !is_valid_name(nick) {
            return Err(ProtocolError::MalformedJoin("invalid nick"));
        }

        Ok(JoinCommand {
            room: room.to_vec(),
            nick: nick.to_vec(),
        })
    }

    /// Re-serializes to the wire form, used by R1's round-trip property.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.room.len() + self.nick.len() + 7);
        out.extend_from_slice(b"JOIN ");
        out.extend_from_slice(&self.room);
        out.push(b' ');
        out.extend_from_slice(&self.nick);
        out.push(b'\n');
        out
    }
}
