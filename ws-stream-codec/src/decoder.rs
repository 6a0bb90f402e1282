use std::cmp;
use std::convert::TryFrom;
use std::io::{self, Read};

use bytes::BytesMut;
use log::trace;
use tokio_util::codec::Decoder;

use crate::frame::{FrameHeader, FrameHeaderCodec};
use crate::mask::Mask;
use crate::{Opcode, Result};

const MAX_HEADER_LEN: usize = 2 + 4 + 4;

/// The result of one [`FrameDecoder::decode`](struct.FrameDecoder.html#method.decode) call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketInfo {
    /// The opcode of the message these bytes belong to.
    ///
    /// For a continuation frame this is the opcode of the `Text` or `Binary` frame that started the message. For a
    /// control frame it is the control opcode itself.
    pub opcode: Opcode,

    /// The number of bytes written to the front of the caller's buffer.
    pub bytes_delivered: usize,

    /// `true` when the frame had its FIN bit set and this call delivered the last of its payload.
    ///
    /// This describes the frame, not the message: a fragmented message ends with the first continuation frame
    /// whose chunk reports `fin`.
    pub fin: bool,
}

/// Decoding state that persists across calls on one connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderState {
    remaining_in_frame: u64,
    current_message_opcode: Opcode,
    frame_opcode: Opcode,
    frame_fin: bool,
    mask_key: Option<Mask>,
    mask_cursor: usize,
}

impl DecoderState {
    /// Returns the number of payload bytes of the current frame not yet handed to the caller.
    pub fn remaining_in_frame(&self) -> u64 {
        self.remaining_in_frame
    }

    /// Returns the opcode of the most recent `Text` or `Binary` frame, which continuation frames inherit.
    ///
    /// Before any data frame has arrived this is `Opcode::Continuation`.
    pub fn current_message_opcode(&self) -> Opcode {
        self.current_message_opcode
    }

    /// Returns the mask key of the current frame, if it carried one.
    pub fn mask_key(&self) -> Option<Mask> {
        self.mask_key
    }

    /// Returns the position within the mask key at which the next payload byte will be unmasked.
    pub fn mask_cursor(&self) -> usize {
        self.mask_cursor
    }

    fn begin_frame(&mut self, header: &FrameHeader) -> Result<()> {
        let raw = Opcode::try_from(header.opcode())?;

        self.frame_opcode = if raw == Opcode::Continuation {
            self.current_message_opcode
        } else if raw.is_control() {
            raw
        } else {
            self.current_message_opcode = raw;
            raw
        };

        self.frame_fin = header.fin();
        self.remaining_in_frame = header.data_len().len() as u64;
        self.mask_key = header.mask();
        self.mask_cursor = 0;
        Ok(())
    }
}

impl Default for DecoderState {
    fn default() -> Self {
        DecoderState {
            remaining_in_frame: 0,
            current_message_opcode: Opcode::Continuation,
            frame_opcode: Opcode::Continuation,
            frame_fin: false,
            mask_key: None,
            mask_cursor: 0,
        }
    }
}

/// Reads WebSocket frames from a blocking stream, one caller-sized chunk at a time.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: DecoderState,
    header_buf: BytesMut,
}

impl FrameDecoder {
    /// Creates a decoder with no frame in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state carried between calls.
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Reads the next chunk of payload from `stream` into the front of `buf`.
    ///
    /// When no frame is in progress this first reads a whole frame header, blocking until it has arrived. It then
    /// issues at most one read for payload, of no more than `buf.len()` bytes and no more than the rest of the
    /// frame. A frame with an empty payload yields a `PacketInfo` with `bytes_delivered == 0`.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Decode` if the header holds a reserved opcode, and with `Error::Transport` if reading
    /// fails or the stream ends inside a frame. The decoder must not be used after either error.
    pub fn decode<R: Read + ?Sized>(&mut self, stream: &mut R, buf: &mut [u8]) -> Result<PacketInfo> {
        if self.state.remaining_in_frame == 0 {
            self.read_header(stream)?;
        }

        let want = cmp::min(self.state.remaining_in_frame, buf.len() as u64) as usize;
        let n = if want == 0 { 0 } else { read_some(stream, &mut buf[..want])? };
        self.state.remaining_in_frame -= n as u64;

        if let Some(mask) = self.state.mask_key {
            self.state.mask_cursor = mask.apply(&mut buf[..n], self.state.mask_cursor);
        }

        Ok(PacketInfo {
            opcode: self.state.frame_opcode,
            bytes_delivered: n,
            fin: self.state.frame_fin && self.state.remaining_in_frame == 0,
        })
    }

    fn read_header<R: Read + ?Sized>(&mut self, stream: &mut R) -> Result<()> {
        let mut raw = [0; MAX_HEADER_LEN];
        stream.read_exact(&mut raw[..2])?;

        let header_len = FrameHeader::header_len_from_prefix(raw[1]);
        stream.read_exact(&mut raw[2..header_len])?;

        self.header_buf.clear();
        self.header_buf.extend_from_slice(&raw[..header_len]);

        let header = FrameHeaderCodec
            .decode(&mut self.header_buf)?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;

        self.state.begin_frame(&header)?;

        trace!(
            "frame header: fin={} opcode={:?} len={} masked={}",
            header.fin(),
            self.state.frame_opcode,
            self.state.remaining_in_frame,
            header.mask().is_some()
        );

        Ok(())
    }
}

fn read_some<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed in the middle of a frame",
                ));
            }
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
