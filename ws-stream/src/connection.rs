use std::io::{Read, Write};

use bytes::BytesMut;

use crate::{DecoderState, FrameCodec, KeySource, Opcode, PacketInfo, PrefixedStream, Result, ThreadRngSource};

/// An established WebSocket connection.
///
/// Every frame sent is masked with a fresh key, except through
/// [`send_unmasked`](#method.send_unmasked). Incoming frames are read into a buffer supplied by the caller; see
/// [`receive`](#method.receive).
///
/// After `receive` returns an error the connection is in an undefined state and should be dropped.
#[derive(Debug)]
pub struct WebSocketConnection<S, K = ThreadRngSource> {
    stream: PrefixedStream<S>,
    codec: FrameCodec<K>,
}

impl<S> WebSocketConnection<S> {
    /// Takes over a stream on which the upgrade handshake has already completed.
    pub fn new(stream: S) -> Self {
        Self::from_parts(PrefixedStream::new(BytesMut::new(), stream), FrameCodec::new())
    }
}

impl<S, K> WebSocketConnection<S, K> {
    pub(crate) fn from_parts(stream: PrefixedStream<S>, codec: FrameCodec<K>) -> Self {
        WebSocketConnection { stream, codec }
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.stream.get_ref()
    }

    /// Returns a mutable reference to the underlying stream.
    ///
    /// Shutting the stream down from here is the way to abort a `receive` blocked on another thread, provided the
    /// stream type allows it (for example through `TcpStream::try_clone`).
    pub fn get_mut(&mut self) -> &mut S {
        self.stream.get_mut()
    }

    /// Consumes the connection, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    /// Does nothing.
    ///
    /// No Close frame is sent and the stream stays open. To close cleanly, send a Close frame with
    /// [`send_frame`](#method.send_frame), wait for the server's Close, then drop the connection.
    pub fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Read + Write, K: KeySource> WebSocketConnection<S, K> {
    /// Sends `payload` as a masked `Text` frame.
    ///
    /// The payload is not checked for valid UTF-8.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.codec.encode(&mut self.stream, payload, true)
    }

    /// Sends `payload` as an unmasked `Text` frame.
    ///
    /// RFC 6455 requires clients to mask, and servers may drop the connection on receiving an unmasked frame.
    pub fn send_unmasked(&mut self, payload: &[u8]) -> Result<()> {
        self.codec.encode(&mut self.stream, payload, false)
    }

    /// Sends `payload` as a masked `Binary` frame.
    pub fn send_binary(&mut self, payload: &[u8]) -> Result<()> {
        self.send_frame(Opcode::Binary, payload)
    }

    /// Sends `payload` as a masked frame with the given opcode, such as `Pong` in reply to a `Ping`.
    pub fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<()> {
        self.codec.encode_frame(&mut self.stream, opcode, payload, true)
    }

    /// Reads the next chunk of an incoming frame into `buf`.
    ///
    /// Blocks until a frame header and at least one byte of payload (if the frame has any) have arrived.
    /// `PacketInfo::fin` marks the end of a frame with its FIN bit set; a text or binary message can span several
    /// frames, and control frames can arrive between them.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<PacketInfo> {
        self.codec.decode(&mut self.stream, buf)
    }

    /// Returns the decoder's state.
    pub fn state(&self) -> &DecoderState {
        self.codec.state()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use crate::test_util::ReadWritePair;
    use crate::{FixedKeys, FrameCodec, Opcode, PrefixedStream, WebSocketConnection};

    fn connection(input: &[u8]) -> WebSocketConnection<ReadWritePair<Cursor<Vec<u8>>, Vec<u8>>, FixedKeys> {
        WebSocketConnection::from_parts(
            PrefixedStream::new(BytesMut::new(), ReadWritePair(Cursor::new(input.to_vec()), Vec::new())),
            FrameCodec::with_key_source(FixedKeys([1, 2, 3, 4])),
        )
    }

    #[test]
    fn send_masks() {
        let mut conn = connection(b"");
        conn.send(b"abcd").unwrap();
        assert_eq!(b"\x81\x84\x01\x02\x03\x04\x60\x60\x60\x60", &conn.get_ref().1[..]);
    }

    #[test]
    fn send_unmasked() {
        let mut conn = connection(b"");
        conn.send_unmasked(b"abcd").unwrap();
        assert_eq!(b"\x81\x04abcd", &conn.get_ref().1[..]);
    }

    #[test]
    fn send_binary_and_pong() {
        let mut conn = connection(b"");
        conn.send_binary(&[0x01]).unwrap();
        conn.send_frame(Opcode::Pong, b"").unwrap();
        assert_eq!(
            b"\x82\x81\x01\x02\x03\x04\x00\x8a\x80\x01\x02\x03\x04",
            &conn.get_ref().1[..]
        );
    }

    #[test]
    fn receives_fragmented_message_with_ping() {
        let mut conn = connection(b"\x01\x02ab\x89\x00\x80\x01c");
        let mut buf = [0; 8];
        let mut message = Vec::new();
        let mut pings = 0;
        loop {
            let info = conn.receive(&mut buf).unwrap();
            match info.opcode {
                Opcode::Ping => pings += 1,
                Opcode::Text => {
                    message.extend_from_slice(&buf[..info.bytes_delivered]);
                    if info.fin {
                        break;
                    }
                }
                opcode => panic!("unexpected opcode {:?}", opcode),
            }
        }

        assert_eq!(1, pings);
        assert_eq!(b"abc", &message[..]);
    }

    #[test]
    fn pong_echoes_ping_read_in_chunks() {
        let mut conn = connection(b"\x89\x05hello");
        let mut buf = [0; 2];
        let mut ping = Vec::new();
        loop {
            let info = conn.receive(&mut buf).unwrap();
            assert_eq!(Opcode::Ping, info.opcode);
            ping.extend_from_slice(&buf[..info.bytes_delivered]);
            if info.fin {
                conn.send_frame(Opcode::Pong, &ping).unwrap();
                break;
            }
        }

        assert_eq!(
            b"\x8a\x85\x01\x02\x03\x04\x69\x67\x6f\x68\x6e",
            &conn.get_ref().1[..]
        );
    }

    #[test]
    fn close_is_a_no_op() {
        let mut conn = connection(b"");
        conn.close().unwrap();
        assert!(conn.get_ref().1.is_empty());
        conn.send(b"").unwrap();
        assert_eq!(6, conn.get_ref().1.len());
    }

    #[test]
    fn new_takes_over_established_stream() {
        let mut conn = WebSocketConnection::new(ReadWritePair(Cursor::new(b"\x81\x02hi".to_vec()), Vec::new()));
        let mut buf = [0; 4];
        let info = conn.receive(&mut buf).unwrap();
        assert_eq!((Opcode::Text, 2, true), (info.opcode, info.bytes_delivered, info.fin));
        assert_eq!(Opcode::Text, conn.state().current_message_opcode());
    }

    #[test]
    fn eof_is_transport_error() {
        let mut conn = connection(b"");
        let mut buf = [0; 4];
        assert!(conn.receive(&mut buf).unwrap_err().is_transport());
    }
}
