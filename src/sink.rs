//! Output sinks: abstract byte destinations for serialized output.

use bytes::{BufMut, BytesMut};

use crate::error::{Error, Result};

/// An appendable byte destination.
///
/// Sinks never own the bytes they consume and are never assumed to be
/// seekable. Methods are fallible because stream-backed sinks perform I/O.
pub trait Sink {
    /// Appends a single byte.
    fn push_byte(&mut self, b: u8) -> Result<()>;

    /// Appends a run of bytes.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Hints that at least `n` more bytes are coming.
    fn reserve(&mut self, _n: usize) -> Result<()> {
        Ok(())
    }
}

/// Appends into a caller-provided byte buffer.
pub struct BufferSink<'a> {
    buffer: &'a mut BytesMut,
}

impl<'a> BufferSink<'a> {
    pub fn new(buffer: &'a mut BytesMut) -> Self {
        Self { buffer }
    }
}

impl Sink for BufferSink<'_> {
    fn push_byte(&mut self, b: u8) -> Result<()> {
        self.buffer.put_u8(b);
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        self.buffer.reserve(n);
        Ok(())
    }
}

/// Collects bytes and converts to an owned `String` at the end.
#[derive(Default)]
pub struct StringSink {
    buffer: Vec<u8>,
}

impl StringSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the collected bytes as UTF-8 and hands them out.
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.buffer).map_err(|_| Error::InvalidUtf8Sequence)
    }
}

impl Sink for StringSink {
    fn push_byte(&mut self, b: u8) -> Result<()> {
        self.buffer.push(b);
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn reserve(&mut self, n: usize) -> Result<()> {
        self.buffer.reserve(n);
        Ok(())
    }
}

/// Counts bytes without storing them.
#[derive(Default)]
pub struct LengthSink {
    length: usize,
}

impl LengthSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Sink for LengthSink {
    fn push_byte(&mut self, _b: u8) -> Result<()> {
        self.length += 1;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.length += bytes.len();
        Ok(())
    }
}

/// Streams bytes into any [`std::io::Write`].
pub struct WriterSink<W> {
    writer: W,
}

impl<W: std::io::Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: std::io::Write> Sink for WriterSink<W> {
    fn push_byte(&mut self, b: u8) -> Result<()> {
        self.writer.write_all(&[b])?;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }
}
