use std::io;
use std::result;

use thiserror::Error;

/// Represents results returned by the functions in this crate.
pub type Result<T> = result::Result<T, Error>;

/// Represents errors that can be exposed by this crate.
///
/// A `Decode` or `Transport` error returned while receiving leaves the connection in an undefined state. Callers
/// should drop the connection instead of reading from it again.
#[derive(Debug, Error)]
pub enum Error {
    /// The peer sent bytes that are not a valid WebSocket frame.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Reading from, writing to or flushing the underlying stream failed.
    ///
    /// A stream that closes in the middle of a frame header or payload surfaces here as
    /// `io::ErrorKind::UnexpectedEof`.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The HTTP upgrade exchange did not produce a WebSocket connection.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),
}

impl Error {
    /// Returns `true` if this is a `Decode` error.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if this is a `Transport` error.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns `true` if this is a `Handshake` error.
    #[must_use]
    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::Handshake(_))
    }
}

/// Frame-level protocol violations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The opcode nibble holds one of the reserved values 0x3-0x7 or 0xB-0xF.
    #[error("invalid opcode {0:#x}")]
    InvalidOpcode(u8),
}

/// Reasons why the opening handshake can fail.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The server answered with something other than `101 Switching Protocols`.
    #[error("server responded with HTTP status {code}{}", format_reason(.reason))]
    Status {
        /// The HTTP status code.
        code: u16,
        /// The reason phrase, if the server sent one.
        reason: Option<String>,
    },

    /// The URI has no host component.
    #[error("URI has no host")]
    MissingHost,

    /// The URI has no path component.
    #[error("URI has no path")]
    MissingPath,

    /// The URI could not be parsed.
    #[error("invalid URI: {0}")]
    InvalidUri(String),

    /// The server's response is not valid HTTP.
    #[error("malformed HTTP response: {0}")]
    Malformed(#[from] httparse::Error),

    /// A header needed to validate the response is absent.
    #[error("server didn't respond with {0} header")]
    MissingHeader(&'static str),

    /// The server's `Sec-WebSocket-Accept` header does not match the key that was sent.
    #[error("server responded with incorrect Sec-WebSocket-Accept header: expected {expected}, got {actual}")]
    AcceptMismatch {
        /// The value computed from the client's key.
        expected: String,
        /// The value the server sent.
        actual: String,
    },
}

fn format_reason(reason: &Option<String>) -> String {
    reason.as_ref().map(|r| format!(": {:?}", r)).unwrap_or_default()
}
