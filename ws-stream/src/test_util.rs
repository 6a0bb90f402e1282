use std::io::{self, Read, Write};

#[derive(Debug)]
pub struct ReadWritePair<R, W>(pub R, pub W);

impl<R: Read, W> Read for ReadWritePair<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R, W: Write> Write for ReadWritePair<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.1.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.1.flush()
    }
}
