use std::io;

/// Errors reported by [`Channel`](crate::Channel) operations.
///
/// End-of-data is not an error: a drained, shut-down direction reads as
/// `Ok(0)`.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// No data (read) or no space (write) is available right now. Retry later.
    #[error("operation would block")]
    WouldBlock,

    /// The direction has been shut down, or nobody is left to read it.
    /// Permanent for that direction.
    #[error("broken pipe")]
    BrokenPipe,

    /// Buffer storage could not be allocated.
    #[error("failed to allocate {requested} bytes of buffer storage")]
    Alloc { requested: usize },

    /// An I/O error from a wrapped stream.
    #[error("channel I/O error: {0}")]
    Io(io::Error),
}

impl ChannelError {
    /// True for the transient "try again later" condition.
    pub fn is_would_block(&self) -> bool {
        matches!(self, ChannelError::WouldBlock)
    }

    /// True when the direction is permanently unusable for writing.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, ChannelError::BrokenPipe)
    }
}

impl From<io::Error> for ChannelError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock => ChannelError::WouldBlock,
            io::ErrorKind::BrokenPipe => ChannelError::BrokenPipe,
            _ => ChannelError::Io(err),
        }
    }
}

impl From<ChannelError> for io::Error {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::WouldBlock => io::Error::from(io::ErrorKind::WouldBlock),
            ChannelError::BrokenPipe => io::Error::from(io::ErrorKind::BrokenPipe),
            ChannelError::Alloc { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            ChannelError::Io(io) => io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
