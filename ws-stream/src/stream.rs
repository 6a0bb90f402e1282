use std::cmp;
use std::io::{self, Read, Write};

use bytes::{Buf, BytesMut};

/// A byte stream that first replays bytes already read from it.
///
/// The upgrade response and the first frames can arrive in the same read. Whatever was read past the end of the
/// HTTP response is kept here and handed out before the underlying stream is read again.
#[derive(Debug)]
pub struct PrefixedStream<S> {
    prefix: BytesMut,
    inner: S,
}

impl<S> PrefixedStream<S> {
    /// Wraps `inner`, replaying `prefix` before any bytes from `inner`.
    pub fn new(prefix: BytesMut, inner: S) -> Self {
        PrefixedStream { prefix, inner }
    }

    /// Returns the number of replayed bytes still waiting to be read.
    pub fn buffered(&self) -> usize {
        self.prefix.len()
    }

    /// Returns a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Returns the underlying stream. Replayed bytes that have not been read are lost.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> Read for PrefixedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.prefix.is_empty() {
            return self.inner.read(buf);
        }

        let n = cmp::min(buf.len(), self.prefix.len());
        buf[..n].copy_from_slice(&self.prefix[..n]);
        self.prefix.advance(n);
        Ok(n)
    }
}

impl<S: Write> Write for PrefixedStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf)
    }
}
