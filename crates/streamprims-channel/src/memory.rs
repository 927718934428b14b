use bytes::{Buf, Bytes, BytesMut};

use crate::error::{ChannelError, Result};
use crate::traits::Channel;

/// Growable in-memory channel.
///
/// Writes append and reads drain in FIFO order. While the buffer is still
/// writable, reading it empty reports `WouldBlock`; once it has been shut
/// down (or was built read-only from fixed contents) an empty read is
/// end-of-data.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    buf: BytesMut,
    limit: Option<usize>,
    write_shutdown: bool,
}

impl MemoryBuffer {
    /// Empty, unbounded, writable buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty writable buffer holding at most `limit` bytes at a time.
    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Read-only buffer over fixed contents. Reads return end-of-data once
    /// `data` is drained and writes fail with `BrokenPipe`.
    pub fn read_only(data: impl AsRef<[u8]>) -> Self {
        Self {
            buf: BytesMut::from(data.as_ref()),
            limit: None,
            write_shutdown: true,
        }
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the buffered bytes without consuming them.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Take all buffered bytes.
    pub fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub fn is_write_shutdown(&self) -> bool {
        self.write_shutdown
    }
}

impl Channel for MemoryBuffer {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.buf.is_empty() {
            return if self.write_shutdown {
                Ok(0)
            } else {
                Err(ChannelError::WouldBlock)
            };
        }

        let n = buf.len().min(self.buf.len());
        buf[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.write_shutdown {
            return Err(ChannelError::BrokenPipe);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = buf.len().min(self.query_write_capacity());
        if n == 0 {
            return Err(ChannelError::WouldBlock);
        }
        self.buf.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn query_write_capacity(&self) -> usize {
        match self.limit {
            Some(limit) => limit.saturating_sub(self.buf.len()),
            None => usize::MAX - self.buf.len(),
        }
    }

    fn query_read_demand(&self) -> usize {
        0
    }

    fn shutdown_write(&mut self) -> Result<()> {
        self.write_shutdown = true;
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "memory-buffer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_buffer_blocks_when_empty() {
        let mut mem = MemoryBuffer::new();
        let mut out = [0u8; 4];
        let err = mem.read(&mut out).unwrap_err();
        assert!(err.is_would_block());
    }

    #[test]
    fn write_then_read_fifo() {
        let mut mem = MemoryBuffer::new();
        assert_eq!(mem.write(b"abc").unwrap(), 3);
        assert_eq!(mem.write(b"de").unwrap(), 2);

        let mut out = [0u8; 4];
        assert_eq!(mem.read(&mut out).unwrap(), 4);
        assert_eq!(&out, b"abcd");
        assert_eq!(mem.read(&mut out).unwrap(), 1);
        assert_eq!(out[0], b'e');
    }

    #[test]
    fn read_only_buffer_reports_end_of_data() {
        let mut mem = MemoryBuffer::read_only(b"xy");
        let mut out = [0u8; 8];
        assert_eq!(mem.read(&mut out).unwrap(), 2);
        assert_eq!(mem.read(&mut out).unwrap(), 0);
        assert!(mem.write(b"z").unwrap_err().is_broken_pipe());
    }

    #[test]
    fn bounded_buffer_accepts_partial_write() {
        let mut mem = MemoryBuffer::bounded(4);
        assert_eq!(mem.write(b"123456").unwrap(), 4);
        assert_eq!(mem.query_write_capacity(), 0);
        assert!(mem.write(b"7").unwrap_err().is_would_block());

        let mut out = [0u8; 3];
        mem.read(&mut out).unwrap();
        assert_eq!(mem.query_write_capacity(), 3);
    }

    #[test]
    fn shutdown_drains_then_eof() {
        let mut mem = MemoryBuffer::new();
        mem.write(b"tail").unwrap();
        mem.shutdown_write().unwrap();
        assert!(mem.write(b"more").unwrap_err().is_broken_pipe());

        let mut out = [0u8; 8];
        assert_eq!(mem.read(&mut out).unwrap(), 4);
        assert_eq!(mem.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn take_returns_buffered_bytes() {
        let mut mem = MemoryBuffer::new();
        mem.write(b"payload").unwrap();
        assert_eq!(mem.take().as_ref(), b"payload");
        assert!(mem.is_empty());
    }
}
