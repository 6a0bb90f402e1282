#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![deny(warnings)]

//! A blocking codec for the WebSocket protocol (RFC 6455), client side.
//!
//! This crate turns any `Read + Write` byte stream into WebSocket frames and back. It does not open connections
//! itself. For a full WebSocket client, see the `ws-stream` crate.
//!
//! The decoder hands frame payload to the caller in chunks of whatever size the caller asks for, so a large frame
//! never has to be held in memory at once. Messages split across several frames are not reassembled: each
//! [`PacketInfo`](struct.PacketInfo.html) carries the opcode of the message the bytes belong to, and callers
//! accumulate across continuation frames themselves.

mod codec;
mod decoder;
mod encoder;
mod error;
mod frame;
mod key;
mod mask;
mod opcode;
mod upgrade;

pub mod protocol;

pub use crate::codec::FrameCodec;
pub use crate::decoder::{DecoderState, FrameDecoder, PacketInfo};
pub use crate::encoder::FrameEncoder;
pub use crate::error::{DecodeError, Error, HandshakeError, Result};
pub use crate::key::{FixedKeys, KeySource, ThreadRngSource};
pub use crate::mask::Mask;
pub use crate::opcode::Opcode;
pub use crate::upgrade::{build_request, RequestTarget, UpgradeCodec};
