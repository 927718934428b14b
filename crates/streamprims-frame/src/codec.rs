use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{FrameError, MalformedReason, Result};

/// Tag byte + first length byte.
pub const MIN_HEADER_LEN: usize = 2;

/// Tag byte + first length byte + up to four length bytes.
pub const MAX_HEADER_LEN: usize = MIN_HEADER_LEN + MAX_LENGTH_BYTES;

/// Most length bytes accepted in the long form.
pub const MAX_LENGTH_BYTES: usize = 4;

/// First length byte marking an indefinite-length element.
pub const INDEFINITE_LENGTH: u8 = 0x80;

/// Terminator of an indefinite-length element.
pub const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

/// Default maximum element size: 16 MiB.
pub const DEFAULT_MAX_ELEMENT_LEN: usize = 16 * 1024 * 1024;

/// Default limit on nested indefinite-length elements.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Length field of a decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Payload length in bytes.
    Definite(usize),
    /// Nested elements up to an end-of-contents marker.
    Indefinite,
}

/// A decoded tag-length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: u8,
    pub length: Length,
    /// Bytes occupied by the header itself (2..=6).
    pub header_len: usize,
}

impl Header {
    /// Header plus payload, if the length is definite.
    pub fn total_len(&self) -> Option<usize> {
        match self.length {
            Length::Definite(len) => self.header_len.checked_add(len),
            Length::Indefinite => None,
        }
    }
}

/// One complete encoded element: header bytes followed by the full payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    bytes: Bytes,
    header_len: usize,
}

impl Element {
    pub(crate) fn new(bytes: Bytes, header_len: usize) -> Self {
        Self { bytes, header_len }
    }

    pub fn tag(&self) -> u8 {
        self.bytes[0]
    }

    /// Total encoded length, which is also the number of bytes consumed
    /// from the channel.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..self.header_len]
    }

    /// Payload bytes. For an indefinite-length element this is the nested
    /// elements without the trailing end-of-contents marker.
    pub fn contents(&self) -> &[u8] {
        let end = if self.is_indefinite() {
            self.bytes.len() - END_OF_CONTENTS.len()
        } else {
            self.bytes.len()
        };
        &self.bytes[self.header_len..end]
    }

    pub fn is_indefinite(&self) -> bool {
        self.bytes[1] == INDEFINITE_LENGTH
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for Element {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Limits applied while reading elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementConfig {
    /// Maximum total element size (header + payload) in bytes. Default: 16 MiB.
    pub max_len: usize,
    /// Maximum nesting of indefinite-length elements. Default: 64.
    pub max_depth: usize,
}

impl ElementConfig {
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len,
            ..Self::default()
        }
    }
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_ELEMENT_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Decode a tag-length header from the front of `src`.
///
/// Returns `Ok(None)` if `src` does not hold the whole header yet. Rejects
/// non-canonical long-form lengths, zero-padded lengths and more than four
/// length bytes.
///
/// Header layout:
/// ```text
/// ┌─────┬──────────┬──────────────────────────┐
/// │ Tag │ L0       │ L1..Ln (long form only)  │
/// │ 1B  │ 1B       │ n = L0 & 0x7f, 1..=4     │
/// └─────┴──────────┴──────────────────────────┘
/// L0 < 0x80   short form, payload length = L0
/// L0 == 0x80  indefinite, nested elements until 00 00
/// L0 > 0x80   long form, big-endian payload length in L1..Ln
/// ```
pub fn decode_header(src: &[u8]) -> Result<Option<Header>> {
    if src.len() < MIN_HEADER_LEN {
        return Ok(None);
    }

    let tag = src[0];
    let first = src[1];

    if first & 0x80 == 0 {
        return Ok(Some(Header {
            tag,
            length: Length::Definite(usize::from(first)),
            header_len: MIN_HEADER_LEN,
        }));
    }
    if first == INDEFINITE_LENGTH {
        return Ok(Some(Header {
            tag,
            length: Length::Indefinite,
            header_len: MIN_HEADER_LEN,
        }));
    }

    let num_bytes = first & 0x7f;
    if usize::from(num_bytes) > MAX_LENGTH_BYTES {
        return Err(MalformedReason::UnsupportedLengthSize(num_bytes).into());
    }
    if src.len() > MIN_HEADER_LEN && src[MIN_HEADER_LEN] == 0 {
        return Err(MalformedReason::ZeroPaddedLength.into());
    }

    let header_len = MIN_HEADER_LEN + usize::from(num_bytes);
    if src.len() < header_len {
        return Ok(None);
    }

    let len = src[MIN_HEADER_LEN..header_len]
        .iter()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
    if len < 0x80 {
        return Err(MalformedReason::NonCanonicalLength.into());
    }

    Ok(Some(Header {
        tag,
        length: Length::Definite(len as usize),
        header_len,
    }))
}

/// Header length implied by the bytes of `src` seen so far.
fn header_len_hint(src: &[u8]) -> usize {
    match src.get(1) {
        Some(&first) if first & 0x80 != 0 && first != INDEFINITE_LENGTH => {
            MIN_HEADER_LEN + usize::from(first & 0x7f)
        }
        _ => MIN_HEADER_LEN,
    }
}

/// Append the canonical header for a definite-length element.
pub fn encode_header(tag: u8, len: usize, dst: &mut BytesMut) -> Result<()> {
    if len < 0x80 {
        dst.reserve(MIN_HEADER_LEN);
        dst.put_u8(tag);
        dst.put_u8(len as u8);
        return Ok(());
    }

    let len32 = u32::try_from(len).map_err(|_| FrameError::TooLarge {
        size: len,
        max: u32::MAX as usize,
    })?;
    let be = len32.to_be_bytes();
    let skip = be.iter().take_while(|&&b| b == 0).count();
    let num_bytes = be.len() - skip;

    dst.reserve(MIN_HEADER_LEN + num_bytes);
    dst.put_u8(tag);
    dst.put_u8(0x80 | num_bytes as u8);
    dst.put_slice(&be[skip..]);
    Ok(())
}

/// Append the header opening an indefinite-length element.
pub fn encode_indefinite_header(tag: u8, dst: &mut BytesMut) {
    dst.reserve(MIN_HEADER_LEN);
    dst.put_u8(tag);
    dst.put_u8(INDEFINITE_LENGTH);
}

/// Append a complete definite-length element.
pub fn encode_element(tag: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_header(tag, payload.len(), dst)?;
    dst.put_slice(payload);
    Ok(())
}

/// Decode one complete element from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete element yet.
/// On success, consumes the element bytes from the buffer.
pub fn decode_element(src: &mut BytesMut, config: &ElementConfig) -> Result<Option<Element>> {
    let mut scanner = Scanner::default();
    match scanner.advance(src, config)? {
        Progress::Complete { len, header_len } => {
            Ok(Some(Element::new(src.split_to(len).freeze(), header_len)))
        }
        Progress::Incomplete { .. } => Ok(None),
    }
}

/// Outcome of scanning a buffered element prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// The element ends `len` bytes into the buffer.
    Complete { len: usize, header_len: usize },
    /// At least `additional` more bytes are needed, and no byte past the end
    /// of the element is among them. `at_boundary` is set when the next
    /// byte starts a nested element or end-of-contents marker.
    Incomplete { additional: usize, at_boundary: bool },
}

/// Incremental element scanner.
///
/// Keeps its position between calls so each buffered byte is examined once,
/// however many reads it takes to assemble the element.
#[derive(Debug, Default, Clone)]
pub(crate) struct Scanner {
    /// Offset of the next header (or end-of-contents marker) to examine.
    cursor: usize,
    /// Open indefinite-length elements.
    open: usize,
    /// End offset of the definite-length element being skipped.
    pending_end: Option<usize>,
    /// Header length of the outermost element, once decoded.
    header_len: Option<usize>,
}

impl Scanner {
    pub(crate) fn advance(&mut self, src: &[u8], config: &ElementConfig) -> Result<Progress> {
        loop {
            if let Some(end) = self.pending_end {
                if src.len() < end {
                    return Ok(Progress::Incomplete {
                        additional: end - src.len(),
                        at_boundary: false,
                    });
                }
                self.pending_end = None;
                self.cursor = end;
                if self.open == 0 {
                    return Ok(self.complete());
                }
                continue;
            }

            let rest = src.get(self.cursor..).unwrap_or_default();

            if self.open > 0 {
                if rest.len() < END_OF_CONTENTS.len() {
                    return self.need(
                        src.len(),
                        self.cursor + END_OF_CONTENTS.len(),
                        rest.is_empty(),
                        config,
                    );
                }
                if rest[0] == 0 {
                    if rest[1] != 0 {
                        return Err(MalformedReason::InvalidEndOfContents.into());
                    }
                    self.cursor += END_OF_CONTENTS.len();
                    self.open -= 1;
                    if self.open == 0 {
                        return Ok(self.complete());
                    }
                    continue;
                }
            }

            let Some(header) = decode_header(rest)? else {
                let target = self.cursor + header_len_hint(rest);
                return self.need(src.len(), target, false, config);
            };
            trace!(
                tag = header.tag,
                length = ?header.length,
                offset = self.cursor,
                depth = self.open,
                "decoded element header"
            );

            if self.header_len.is_none() {
                self.header_len = Some(header.header_len);
            }
            let content_start = self.cursor + header.header_len;

            match header.length {
                Length::Definite(len) => {
                    let end = content_start.checked_add(len).ok_or(FrameError::TooLarge {
                        size: usize::MAX,
                        max: config.max_len,
                    })?;
                    if end > config.max_len {
                        return Err(FrameError::TooLarge {
                            size: end,
                            max: config.max_len,
                        });
                    }
                    self.pending_end = Some(end);
                }
                Length::Indefinite => {
                    if self.open >= config.max_depth {
                        return Err(MalformedReason::NestingTooDeep(config.max_depth).into());
                    }
                    self.open += 1;
                    self.cursor = content_start;
                }
            }
        }
    }

    fn need(
        &self,
        have: usize,
        target: usize,
        at_boundary: bool,
        config: &ElementConfig,
    ) -> Result<Progress> {
        if target > config.max_len {
            return Err(FrameError::TooLarge {
                size: target,
                max: config.max_len,
            });
        }
        Ok(Progress::Incomplete {
            additional: target - have,
            at_boundary,
        })
    }

    fn complete(&self) -> Progress {
        Progress::Complete {
            len: self.cursor,
            header_len: self.header_len.unwrap_or(MIN_HEADER_LEN),
        }
    }
}
