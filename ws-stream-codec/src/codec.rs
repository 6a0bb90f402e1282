use std::io::{Read, Write};

use crate::{DecoderState, FrameDecoder, FrameEncoder, KeySource, Opcode, PacketInfo, Result, ThreadRngSource};

/// Both halves of the frame engine for one connection.
///
/// The decoder state lives as long as the codec, and nothing else mutates it.
#[derive(Debug)]
pub struct FrameCodec<K = ThreadRngSource> {
    decoder: FrameDecoder,
    encoder: FrameEncoder<K>,
}

impl FrameCodec {
    /// Creates a codec that draws mask keys from the thread-local random number generator.
    pub fn new() -> Self {
        Self::with_key_source(ThreadRngSource)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeySource> FrameCodec<K> {
    /// Creates a codec that draws mask keys from `keys`.
    pub fn with_key_source(keys: K) -> Self {
        FrameCodec {
            decoder: FrameDecoder::new(),
            encoder: FrameEncoder::with_key_source(keys),
        }
    }

    /// Sends `payload` as a `Text` frame. See [`FrameEncoder::encode`](struct.FrameEncoder.html#method.encode).
    pub fn encode<W: Write + ?Sized>(&mut self, stream: &mut W, payload: &[u8], mask: bool) -> Result<()> {
        self.encoder.encode(stream, payload, mask)
    }

    /// Sends `payload` with the given opcode.
    pub fn encode_frame<W: Write + ?Sized>(
        &mut self,
        stream: &mut W,
        opcode: Opcode,
        payload: &[u8],
        mask: bool,
    ) -> Result<()> {
        self.encoder.encode_frame(stream, opcode, payload, mask)
    }

    /// Reads the next chunk of payload. See [`FrameDecoder::decode`](struct.FrameDecoder.html#method.decode).
    pub fn decode<R: Read + ?Sized>(&mut self, stream: &mut R, buf: &mut [u8]) -> Result<PacketInfo> {
        self.decoder.decode(stream, buf)
    }

    /// Returns the decoder's state.
    pub fn state(&self) -> &DecoderState {
        self.decoder.state()
    }

    /// Returns the source of mask keys.
    pub fn key_source_mut(&mut self) -> &mut K {
        self.encoder.key_source_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{FixedKeys, FrameCodec, Opcode};

    fn decode_all(codec: &mut FrameCodec, wire: Vec<u8>, buf_len: usize) -> (Opcode, Vec<u8>) {
        let mut stream = Cursor::new(wire);
        let mut buf = vec![0; buf_len];
        let mut out = Vec::new();
        loop {
            let info = codec.decode(&mut stream, &mut buf).unwrap();
            out.extend_from_slice(&buf[..info.bytes_delivered]);
            if info.fin {
                return (info.opcode, out);
            }
        }
    }

    #[test]
    fn round_trips_length_boundaries() {
        for &len in &[0, 1, 125, 126, 65535, 65536] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            for &mask in &[false, true] {
                let mut codec = FrameCodec::new();
                let mut wire = Vec::new();
                codec.encode(&mut wire, &payload, mask).unwrap();

                for &buf_len in &[1000, len.max(1), len + 1] {
                    let (opcode, out) = decode_all(&mut FrameCodec::new(), wire.clone(), buf_len);
                    assert_eq!(Opcode::Text, opcode);
                    assert!(out == payload, "length {} mask {} buffer {}", len, mask, buf_len);
                }
            }
        }
    }

    #[test]
    fn state_survives_between_messages() {
        let mut codec = FrameCodec::new();
        let mut wire = Vec::new();
        codec.encode_frame(&mut wire, Opcode::Binary, b"one", true).unwrap();
        codec.encode(&mut wire, b"two", true).unwrap();

        let mut stream = Cursor::new(wire);
        let mut buf = [0; 8];
        let info = codec.decode(&mut stream, &mut buf).unwrap();
        assert_eq!((Opcode::Binary, 3, true), (info.opcode, info.bytes_delivered, info.fin));
        let info = codec.decode(&mut stream, &mut buf).unwrap();
        assert_eq!((Opcode::Text, 3, true), (info.opcode, info.bytes_delivered, info.fin));
        assert_eq!(b"two", &buf[..3]);
        assert_eq!(Opcode::Text, codec.state().current_message_opcode());
    }

    #[test]
    fn encodes_with_its_key_source() {
        let mut codec = FrameCodec::with_key_source(FixedKeys([0; 4]));
        codec.key_source_mut().0 = [0x20; 4];

        let mut wire = Vec::new();
        codec.encode(&mut wire, b"ab", true).unwrap();
        assert_eq!(b"\x81\x82\x20\x20\x20\x20AB", &wire[..]);
    }
}
