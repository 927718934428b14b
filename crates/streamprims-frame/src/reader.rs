use bytes::BytesMut;
use streamprims_channel::Channel;
use tracing::debug;

use crate::codec::{Element, ElementConfig, Progress, Scanner};
use crate::error::{FrameError, MalformedReason, Result};

/// Read exactly one complete element from `channel`.
///
/// Stateless one-shot form of [`ElementReader::read_element`]: if the
/// channel reports `WouldBlock` partway through, the bytes consumed so far
/// are discarded along with the reader. Never reads past the end of the
/// element.
pub fn read_element<C: Channel>(channel: C, max_len: usize) -> Result<Element> {
    ElementReader::with_config(channel, ElementConfig::with_max_len(max_len)).read_element()
}

/// Reads complete elements from any [`Channel`].
///
/// Handles partial reads internally. When the channel has nothing to offer,
/// `read_element` returns a `WouldBlock` channel error and keeps the partial
/// element, so calling it again later resumes where it stopped. Any other
/// error discards the partial element.
pub struct ElementReader<C> {
    inner: C,
    buf: BytesMut,
    scanner: Scanner,
    config: ElementConfig,
}

impl<C: Channel> ElementReader<C> {
    /// Create a new element reader with default configuration.
    pub fn new(inner: C) -> Self {
        Self::with_config(inner, ElementConfig::default())
    }

    /// Create a new element reader with explicit configuration.
    pub fn with_config(inner: C, config: ElementConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            scanner: Scanner::default(),
            config,
        }
    }

    /// Read the next complete element.
    ///
    /// Returns `Err(FrameError::EndOfStream)` when the channel ends cleanly
    /// before the first byte of an element.
    pub fn read_element(&mut self) -> Result<Element> {
        loop {
            let progress = match self.scanner.advance(&self.buf, &self.config) {
                Ok(progress) => progress,
                Err(err) => return Err(self.abandon(err)),
            };

            match progress {
                Progress::Complete { len, header_len } => {
                    let bytes = self.buf.split_to(len).freeze();
                    self.scanner = Scanner::default();
                    return Ok(Element::new(bytes, header_len));
                }
                Progress::Incomplete {
                    additional,
                    at_boundary,
                } => {
                    if let Err(err) = self.fill(additional, at_boundary) {
                        if err.is_would_block() {
                            return Err(err);
                        }
                        return Err(self.abandon(err));
                    }
                }
            }
        }
    }

    /// Read exactly `additional` more bytes into the buffer.
    fn fill(&mut self, additional: usize, at_boundary: bool) -> Result<()> {
        let start = self.buf.len();
        let target = start + additional;
        self.grow_to(target);
        self.buf.resize(target, 0);

        let mut filled = start;
        let result = loop {
            if filled == target {
                break Ok(());
            }
            match self.inner.read(&mut self.buf[filled..target]) {
                Ok(0) => break Err(end_of_data(filled, start, target, at_boundary)),
                Ok(n) => filled += n,
                Err(err) => break Err(FrameError::Channel(err)),
            }
        };

        self.buf.truncate(filled);
        result
    }

    /// Grow the buffer to hold `target` bytes, doubling capacity so an
    /// element of unknown size costs amortized linear time. `target` has
    /// already been checked against `max_len`, and growth never exceeds it.
    fn grow_to(&mut self, target: usize) {
        let capacity = self.buf.capacity();
        if capacity >= target {
            return;
        }
        let wanted = capacity
            .saturating_mul(2)
            .max(target)
            .min(self.config.max_len.max(target));
        self.buf.reserve(wanted - self.buf.len());
    }

    fn abandon(&mut self, err: FrameError) -> FrameError {
        debug!(
            error = %err,
            discarded = self.buf.len(),
            channel = self.inner.channel_name(),
            "rejecting element"
        );
        self.buf.clear();
        self.scanner = Scanner::default();
        err
    }

    /// Bytes of a partially read element held from an earlier `WouldBlock`.
    pub fn partial_len(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the reader and return the inner channel. Any partial element
    /// is dropped.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Update maximum element size for subsequent reads.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.config.max_len = max_len;
    }

    /// Current element reader configuration.
    pub fn config(&self) -> &ElementConfig {
        &self.config
    }
}

fn end_of_data(filled: usize, start: usize, target: usize, at_boundary: bool) -> FrameError {
    if filled == 0 {
        FrameError::EndOfStream
    } else if at_boundary && filled == start {
        FrameError::Malformed(MalformedReason::MissingEndOfContents)
    } else {
        FrameError::Truncated {
            consumed: filled,
            missing: target - filled,
        }
    }
}
