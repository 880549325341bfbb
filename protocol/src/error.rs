use thiserror::Error;

/// Errors surfaced while pulling frames off a connection (spec §4.1).
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error reading frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame exceeded {0} bytes without a newline")]
    TooLarge(usize),

    #[error("connection closed with a partial frame pending")]
    TruncatedEof,
}

/// Errors surfaced while decoding the JOIN handshake (spec §4.2).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JOIN: {0}")]
    MalformedJoin(&'static str),
}
