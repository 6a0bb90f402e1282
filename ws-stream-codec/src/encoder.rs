use std::io::Write;

use bytes::BytesMut;
use log::trace;
use tokio_util::codec::Encoder;

use crate::frame::{DataLength, FrameHeader, FrameHeaderCodec};
use crate::mask::Mask;
use crate::{KeySource, Opcode, Result, ThreadRngSource};

/// Writes WebSocket frames to a blocking stream.
///
/// Every frame is sent whole, with the FIN bit set. The frame is assembled in a buffer that is reused between
/// calls, so after the largest frame has been sent no further allocations are made.
#[derive(Debug)]
pub struct FrameEncoder<K = ThreadRngSource> {
    keys: K,
    write_buf: BytesMut,
}

impl FrameEncoder {
    /// Creates an encoder that draws mask keys from the thread-local random number generator.
    pub fn new() -> Self {
        Self::with_key_source(ThreadRngSource)
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeySource> FrameEncoder<K> {
    /// Creates an encoder that draws mask keys from `keys`.
    pub fn with_key_source(keys: K) -> Self {
        FrameEncoder {
            keys,
            write_buf: BytesMut::new(),
        }
    }

    /// Returns the source of mask keys.
    pub fn key_source_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    /// Sends `payload` as a single `Text` frame, then flushes `stream`.
    ///
    /// When `mask` is `true` a fresh mask key is drawn for the frame, as RFC 6455 requires of clients.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Transport` if writing or flushing fails. Nothing is retried.
    pub fn encode<W: Write + ?Sized>(&mut self, stream: &mut W, payload: &[u8], mask: bool) -> Result<()> {
        self.encode_frame(stream, Opcode::Text, payload, mask)
    }

    /// Sends `payload` as a single frame with the given opcode, then flushes `stream`.
    ///
    /// # Errors
    ///
    /// Fails with `Error::Transport` if writing or flushing fails.
    pub fn encode_frame<W: Write + ?Sized>(
        &mut self,
        stream: &mut W,
        opcode: Opcode,
        payload: &[u8],
        mask: bool,
    ) -> Result<()> {
        self.write_buf.clear();
        self.encode_to(opcode, payload, mask)?;
        trace!(
            "sending {:?} frame: {} payload bytes, {} on the wire",
            opcode,
            payload.len(),
            self.write_buf.len()
        );

        stream.write_all(&self.write_buf)?;
        stream.flush()?;
        Ok(())
    }

    fn encode_to(&mut self, opcode: Opcode, payload: &[u8], mask: bool) -> Result<()> {
        let mask = if mask { Some(Mask::generate(&mut self.keys)) } else { None };
        let header = FrameHeader::new(true, 0, opcode.into(), mask, DataLength::from(payload.len()));

        let dst = &mut self.write_buf;
        FrameHeaderCodec.encode(&header, dst)?;

        let offset = dst.len();
        dst.extend_from_slice(payload);
        if let Some(mask) = mask {
            mask.apply(&mut dst[offset..], 0);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use crate::{FixedKeys, FrameEncoder, Opcode};

    #[test]
    fn unmasked_text() {
        let mut out = Vec::new();
        FrameEncoder::new().encode(&mut out, b"Hello", false).unwrap();
        assert_eq!(b"\x81\x05Hello", &out[..]);
    }

    #[test]
    fn masked_text() {
        let mut out = Vec::new();
        FrameEncoder::with_key_source(FixedKeys([0x37, 0xfa, 0x21, 0x3d]))
            .encode(&mut out, b"Hello", true)
            .unwrap();

        // RFC 6455 section 5.7
        assert_eq!(b"\x81\x85\x37\xfa\x21\x3d\x7f\x9f\x4d\x51\x58", &out[..]);
    }

    #[test]
    fn key_source_can_be_replaced() {
        let mut encoder = FrameEncoder::with_key_source(FixedKeys([1, 2, 3, 4]));
        let mut out = Vec::new();
        encoder.encode(&mut out, b"", true).unwrap();

        *encoder.key_source_mut() = FixedKeys([5, 6, 7, 8]);
        encoder.encode(&mut out, b"", true).unwrap();
        assert_eq!(b"\x81\x80\x01\x02\x03\x04\x81\x80\x05\x06\x07\x08", &out[..]);
    }

    #[test]
    fn fresh_key_per_frame() {
        let mut encoder = FrameEncoder::new();
        let mut a = Vec::new();
        let mut b = Vec::new();
        let payload = [0; 32];
        encoder.encode(&mut a, &payload, true).unwrap();
        encoder.encode(&mut b, &payload, true).unwrap();
        assert_ne!(a[2..6], b[2..6]);
    }

    #[test]
    fn length_encodings() {
        let cases: &[(usize, &[u8])] = &[
            (0, &[0x81, 0x00]),
            (125, &[0x81, 125]),
            (126, &[0x81, 126, 0x00, 126]),
            (65535, &[0x81, 126, 0xff, 0xff]),
            (65536, &[0x81, 127, 0x00, 0x01, 0x00, 0x00]),
        ];

        for &(len, header) in cases {
            let mut out = Vec::new();
            FrameEncoder::new().encode(&mut out, &vec![0; len], false).unwrap();
            assert_eq!(header, &out[..header.len()], "length {}", len);
            assert_eq!(header.len() + len, out.len());
        }
    }

    #[test]
    fn selectable_opcode() {
        let mut out = Vec::new();
        FrameEncoder::new()
            .encode_frame(&mut out, Opcode::Binary, &[1, 2], false)
            .unwrap();
        assert_eq!(b"\x82\x02\x01\x02", &out[..]);
    }

    struct Flushes {
        data: Vec<u8>,
        flushed: usize,
    }

    impl Write for Flushes {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed += 1;
            Ok(())
        }
    }

    #[test]
    fn flushes_after_write() {
        let mut stream = Flushes {
            data: Vec::new(),
            flushed: 0,
        };

        FrameEncoder::new().encode(&mut stream, b"x", true).unwrap();
        assert_eq!(1, stream.flushed);
        assert_eq!(2 + 4 + 1, stream.data.len());
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_transport_error() {
        let e = FrameEncoder::new().encode(&mut Broken, b"x", true).unwrap_err();
        assert!(e.is_transport());
    }
}
