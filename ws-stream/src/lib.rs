#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(warnings)]

//! A small, blocking WebSocket client.
//!
//! [`ClientBuilder`](struct.ClientBuilder.html) performs the HTTP upgrade handshake and hands back a
//! [`WebSocketConnection`](struct.WebSocketConnection.html), which sends masked frames and reads incoming frames
//! into caller-supplied buffers. All I/O is blocking; a connection is meant to be used from one thread at a time.
//!
//! Control frames are handed to the caller as they arrive. Nothing answers pings or closes automatically.
//!
//! `native_tls` provides the TLS functionality for `wss://...` servers by default; enable the `ssl-openssl`
//! feature instead to use OpenSSL.

mod client;
mod connection;
mod ssl;
mod stream;
mod sync;

#[cfg(test)]
mod test_util;

pub use crate::client::ClientBuilder;
pub use crate::connection::WebSocketConnection;
pub use crate::stream::PrefixedStream;

pub use ws_stream_codec::{
    DecodeError, DecoderState, Error, FixedKeys, FrameCodec, HandshakeError, KeySource, Opcode, PacketInfo, Result,
    ThreadRngSource,
};

use std::io::{Read, Write};

/// Used by [`Client`](type.Client.html) to represent types that are `Read` and `Write`.
pub trait NetworkStream: Read + Write {}

impl<S> NetworkStream for S where S: Read + Write {}

/// A connection over plain TCP or TLS, as returned by [`ClientBuilder::connect`](struct.ClientBuilder.html#method.connect).
pub type Client<K = ThreadRngSource> = WebSocketConnection<Box<dyn NetworkStream + Send + 'static>, K>;

/// Connects to a `ws://`, `wss://`, `http://` or `https://` URI.
///
/// # Errors
///
/// Fails with `Error::Handshake` if the URI lacks a host or path or the server does not accept the upgrade, and
/// with `Error::Transport` if connecting or the TLS handshake fails.
pub fn open(uri: &str) -> Result<Client> {
    ClientBuilder::new(uri)?.connect()
}

/// Connects to `host` and requests `path`, on `port` or the default port for the scheme.
///
/// # Errors
///
/// As for [`open`](fn.open.html).
pub fn open_with(host: &str, path: &str, port: Option<u16>, use_tls: bool) -> Result<Client> {
    ClientBuilder::from_parts(host, path, port, use_tls).connect()
}
