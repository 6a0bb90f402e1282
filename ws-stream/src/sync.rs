use std::io::{self, Read};

use bytes::BytesMut;
use tokio_util::codec::Decoder;

const READ_CHUNK: usize = 1024;

/// Drives a `Decoder` over a blocking stream.
pub struct Framed<S, C> {
    stream: S,
    codec: C,
    read_buf: BytesMut,
}

impl<S, C> Framed<S, C> {
    pub fn new(stream: S, codec: C) -> Self {
        Framed {
            stream,
            codec,
            read_buf: BytesMut::new(),
        }
    }

    /// Returns the stream along with any bytes read from it that the codec did not consume.
    pub fn into_parts(self) -> (S, BytesMut) {
        (self.stream, self.read_buf)
    }
}

impl<S: Read, C: Decoder> Framed<S, C> {
    pub fn receive(&mut self) -> Result<Option<C::Item>, C::Error> {
        let mut chunk = [0; READ_CHUNK];
        loop {
            if let Some(item) = self.codec.decode(&mut self.read_buf)? {
                return Ok(Some(item));
            }

            let n = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                return self.codec.decode_eof(&mut self.read_buf);
            }

            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }
}
