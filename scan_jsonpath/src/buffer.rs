use std::io::Read;

use crate::error::{Error, Result};

/// A window over the input stream.
///
/// Bytes before `pos` are consumed and get shifted out on the next read. The
/// window grows only when a single unconsumed token fills it completely, so
/// its size is bounded by the longest token, not by the document.
pub struct Buffer<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,           // Start of the unconsumed bytes
    n_bytes: usize,       // End of the valid bytes
    n_shifted_out: usize, // Number of bytes dropped from the front so far
    max_size: usize,
    eof: bool,
}

impl<R: Read> Buffer<R> {
    #[must_use]
    pub fn new(reader: R, initial_size: usize, max_size: usize) -> Self {
        let initial_size = initial_size.clamp(1, max_size.max(1));
        Buffer {
            reader,
            buf: vec![0u8; initial_size],
            pos: 0,
            n_bytes: 0,
            n_shifted_out: 0,
            max_size: max_size.max(initial_size),
            eof: false,
        }
    }

    /// The unconsumed bytes.
    #[must_use]
    pub fn window(&self) -> &[u8] {
        &self.buf[self.pos..self.n_bytes]
    }

    pub fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.n_bytes);
    }

    /// Absolute input offset of the first unconsumed byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.n_shifted_out + self.pos
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Read from the underlying reader into the buffer.
    ///
    /// Returns the number of bytes read. Zero means the reader is exhausted.
    ///
    /// # Errors
    ///
    /// From the underlying reader, or `TokenTooLarge` if the unconsumed bytes
    /// already occupy the maximal window.
    pub fn read_more(&mut self) -> Result<usize> {
        if self.eof {
            return Ok(0);
        }
        self.shift_buffer();
        if self.n_bytes == self.buf.len() {
            self.grow()?;
        }
        let n_new_bytes = loop {
            match self.reader.read(&mut self.buf[self.n_bytes..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        };
        self.n_bytes += n_new_bytes;
        if n_new_bytes == 0 {
            self.eof = true;
        }
        Ok(n_new_bytes)
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn shift_buffer(&mut self) {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.n_bytes, 0);
            self.n_bytes -= self.pos;
            self.n_shifted_out += self.pos;
            self.pos = 0;
        }
    }

    fn grow(&mut self) -> Result<()> {
        if self.buf.len() >= self.max_size {
            return Err(Error::TokenTooLarge {
                limit: self.max_size,
                index: self.position(),
            });
        }
        let new_size = (self.buf.len() * 2).min(self.max_size);
        log::trace!("growing input window from {} to {new_size} bytes", self.buf.len());
        self.buf.resize(new_size, 0);
        Ok(())
    }
}

impl<R> std::fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Buffer {{ pos: {:?}, n_bytes: {:?}, n_shifted_out: {:?}, capacity: {:?}, eof: {:?} }}",
            self.pos,
            self.n_bytes,
            self.n_shifted_out,
            self.buf.len(),
            self.eof
        )
    }
}
