use bytes::{Buf, BytesMut};
use streamprims_channel::{Channel, ChannelError};

use crate::codec::{encode_element, encode_indefinite_header, ElementConfig, END_OF_CONTENTS};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete elements to any [`Channel`].
///
/// Encoded bytes are queued and pushed out across as many partial writes as
/// the channel needs. When the channel is full, `send`/`flush` return a
/// `WouldBlock` channel error and the unsent tail stays queued for the next
/// [`flush`](Self::flush).
pub struct ElementWriter<C> {
    inner: C,
    pending: BytesMut,
    config: ElementConfig,
}

impl<C: Channel> ElementWriter<C> {
    /// Create a new element writer with default configuration.
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, ElementConfig::default())
    }

    /// Create a new element writer with explicit configuration.
    pub fn with_config(inner: C, config: ElementConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode a definite-length element and try to write it out.
    pub fn send(&mut self, tag: u8, payload: &[u8]) -> Result<()> {
        self.queue(tag, payload)?;
        self.flush()
    }

    /// Encode a definite-length element without writing it yet.
    pub fn queue(&mut self, tag: u8, payload: &[u8]) -> Result<()> {
        let mut encoded = BytesMut::new();
        encode_element(tag, payload, &mut encoded)?;
        if encoded.len() > self.config.max_len {
            return Err(FrameError::TooLarge {
                size: encoded.len(),
                max: self.config.max_len,
            });
        }
        self.pending.extend_from_slice(&encoded);
        Ok(())
    }

    /// Queue the header opening an indefinite-length element. Follow it
    /// with nested elements and [`queue_end_of_contents`](Self::queue_end_of_contents).
    pub fn queue_indefinite_header(&mut self, tag: u8) {
        encode_indefinite_header(tag, &mut self.pending);
    }

    /// Queue an end-of-contents marker.
    pub fn queue_end_of_contents(&mut self) {
        self.pending.extend_from_slice(&END_OF_CONTENTS);
    }

    /// Write queued bytes until none are left or the channel pushes back.
    pub fn flush(&mut self) -> Result<()> {
        while !self.pending.is_empty() {
            match self.inner.write(&self.pending) {
                Ok(0) => return Err(FrameError::Channel(ChannelError::BrokenPipe)),
                Ok(n) => self.pending.advance(n),
                Err(err) => return Err(FrameError::Channel(err)),
            }
        }
        Ok(())
    }

    /// Flush everything, then shut down the channel's write direction.
    pub fn shutdown(&mut self) -> Result<()> {
        self.flush()?;
        self.inner.shutdown_write()?;
        Ok(())
    }

    /// Bytes queued but not yet accepted by the channel.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the writer and return the inner channel. Queued bytes are
    /// dropped.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Update maximum element size for subsequent encoding.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.config.max_len = max_len;
    }

    /// Current element writer configuration.
    pub fn config(&self) -> &ElementConfig {
        &self.config
    }
}
