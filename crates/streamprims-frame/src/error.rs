use streamprims_channel::ChannelError;

/// Why an element's encoding was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    /// Long-form length whose value fits in the short form.
    #[error("length should have used the short form")]
    NonCanonicalLength,

    /// Long-form length with a leading zero byte.
    #[error("length has leading zero padding")]
    ZeroPaddedLength,

    /// Long-form length with more length bytes than supported.
    #[error("unsupported length-of-length ({0} bytes, max 4)")]
    UnsupportedLengthSize(u8),

    /// The channel ended inside an indefinite-length element between two
    /// nested elements.
    #[error("missing end-of-contents marker")]
    MissingEndOfContents,

    /// Tag 0x00 inside an indefinite-length element with a non-zero length.
    #[error("invalid end-of-contents marker")]
    InvalidEndOfContents,

    /// Indefinite-length elements nested deeper than the configured limit.
    #[error("indefinite-length nesting deeper than {0}")]
    NestingTooDeep(usize),
}

/// Errors that can occur while reading or writing elements.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The channel ended before the declared element was complete.
    #[error("element truncated after {consumed} bytes ({missing} more expected)")]
    Truncated { consumed: usize, missing: usize },

    /// The length encoding is structurally invalid.
    #[error("malformed element: {0}")]
    Malformed(#[from] MalformedReason),

    /// The element (declared or accumulated so far) exceeds the size limit.
    #[error("element too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The channel ended cleanly before the first byte of an element.
    #[error("end of stream")]
    EndOfStream,

    /// Error from the underlying channel, including `WouldBlock`.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl FrameError {
    /// True when the underlying channel had nothing to offer right now.
    pub fn is_would_block(&self) -> bool {
        matches!(self, FrameError::Channel(err) if err.is_would_block())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
