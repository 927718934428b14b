use crate::error::Result;

/// A non-blocking byte channel.
///
/// Every implementation reports "nothing available right now" as
/// [`ChannelError::WouldBlock`](crate::ChannelError::WouldBlock) instead of
/// suspending the caller. `Ok(0)` from [`read`](Channel::read) with a
/// non-empty buffer means end-of-data: the write side was shut down and all
/// buffered bytes have been drained.
pub trait Channel {
    /// Read up to `buf.len()` bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write as many bytes of `buf` as currently fit.
    ///
    /// Returns the accepted count, which may be less than `buf.len()`.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Free space in the write direction. A closed direction still reports
    /// its free space; the next [`write`](Channel::write) fails instead.
    fn query_write_capacity(&self) -> usize;

    /// Bytes the peer is currently waiting to read from this channel's
    /// write direction. 0 when nobody is waiting.
    fn query_read_demand(&self) -> usize;

    /// Half-close the write direction. Terminal; calling it again is a no-op.
    fn shutdown_write(&mut self) -> Result<()>;

    /// Channel name for diagnostics.
    fn channel_name(&self) -> &'static str;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn query_write_capacity(&self) -> usize {
        (**self).query_write_capacity()
    }

    fn query_read_demand(&self) -> usize {
        (**self).query_read_demand()
    }

    fn shutdown_write(&mut self) -> Result<()> {
        (**self).shutdown_write()
    }

    fn channel_name(&self) -> &'static str {
        (**self).channel_name()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn query_write_capacity(&self) -> usize {
        (**self).query_write_capacity()
    }

    fn query_read_demand(&self) -> usize {
        (**self).query_read_demand()
    }

    fn shutdown_write(&mut self) -> Result<()> {
        (**self).shutdown_write()
    }

    fn channel_name(&self) -> &'static str {
        (**self).channel_name()
    }
}
