use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::debug;

use crate::error::{ChannelError, Result};
use crate::traits::Channel;

/// Streams whose write half can be closed independently.
pub trait HalfClose {
    fn close_write(&self) -> std::io::Result<()>;
}

impl HalfClose for TcpStream {
    fn close_write(&self) -> std::io::Result<()> {
        self.shutdown(Shutdown::Write)
    }
}

#[cfg(unix)]
impl HalfClose for std::os::unix::net::UnixStream {
    fn close_write(&self) -> std::io::Result<()> {
        self.shutdown(Shutdown::Write)
    }
}

/// Adapts an already-connected std stream to the [`Channel`] contract.
///
/// The stream should be in non-blocking mode; a blocking stream still works
/// but then `read`/`write` may suspend the caller. `WouldBlock` and
/// `BrokenPipe` from the OS map onto the matching [`ChannelError`]s and
/// `Interrupted` is retried.
///
/// A socket gives no write guarantee, so [`Channel::query_write_capacity`]
/// reports 0, and the peer's read demand is unknown (also 0).
pub struct StreamChannel<T> {
    inner: T,
    write_shutdown: bool,
}

impl<T: Read + Write + HalfClose> StreamChannel<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            write_shutdown: false,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the adapter and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + HalfClose> Channel for StreamChannel<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if self.write_shutdown {
            return Err(ChannelError::BrokenPipe);
        }
        loop {
            match self.inner.write(buf) {
                Ok(0) if !buf.is_empty() => return Err(ChannelError::BrokenPipe),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn query_write_capacity(&self) -> usize {
        0
    }

    fn query_read_demand(&self) -> usize {
        0
    }

    fn shutdown_write(&mut self) -> Result<()> {
        if self.write_shutdown {
            return Ok(());
        }
        self.inner.flush()?;
        self.inner.close_write()?;
        self.write_shutdown = true;
        debug!("stream write half closed");
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "stream"
    }
}

impl<T> std::fmt::Debug for StreamChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChannel")
            .field("write_shutdown", &self.write_shutdown)
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::net::UnixStream;

    use super::*;

    fn nonblocking_pair() -> (StreamChannel<UnixStream>, StreamChannel<UnixStream>) {
        let (left, right) = UnixStream::pair().unwrap();
        left.set_nonblocking(true).unwrap();
        right.set_nonblocking(true).unwrap();
        (StreamChannel::new(left), StreamChannel::new(right))
    }

    #[test]
    fn roundtrip_over_socket_pair() {
        let (mut left, mut right) = nonblocking_pair();
        assert_eq!(left.write(b"ping").unwrap(), 4);

        let mut out = [0u8; 4];
        assert_eq!(right.read(&mut out).unwrap(), 4);
        assert_eq!(&out, b"ping");
    }

    #[test]
    fn empty_socket_would_block() {
        let (_left, mut right) = nonblocking_pair();
        let mut out = [0u8; 4];
        assert!(right.read(&mut out).unwrap_err().is_would_block());
    }

    #[test]
    fn shutdown_gives_peer_end_of_data() {
        let (mut left, mut right) = nonblocking_pair();
        left.write(b"fin").unwrap();
        left.shutdown_write().unwrap();
        left.shutdown_write().unwrap();
        assert!(left.write(b"x").unwrap_err().is_broken_pipe());

        let mut out = [0u8; 8];
        assert_eq!(right.read(&mut out).unwrap(), 3);
        assert_eq!(right.read(&mut out).unwrap(), 0);
    }

    #[test]
    fn accessors_and_into_inner() {
        let (mut left, _right) = nonblocking_pair();
        let _ = left.get_ref();
        let _ = left.get_mut();
        assert_eq!(left.channel_name(), "stream");
        let _inner = left.into_inner();
    }
}
