//! Streaming tag-length-value element framing over non-blocking channels.
//!
//! Reads one complete BER/DER-style element at a time from any
//! [`Channel`](streamprims_channel::Channel) without knowing its size up
//! front:
//! - short-form (0–127) and long-form (1–4 length bytes) definite lengths,
//!   with non-canonical encodings rejected
//! - indefinite lengths, assembled from nested elements up to the
//!   end-of-contents marker
//! - a caller-supplied size limit enforced before any payload is buffered
//!
//! The reader never consumes bytes beyond the element it returns.

pub mod codec;
pub mod error;
pub mod reader;
pub mod tag;
pub mod writer;

pub use codec::{
    decode_element, decode_header, encode_element, encode_header, encode_indefinite_header,
    Element, ElementConfig, Header, Length, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ELEMENT_LEN,
    END_OF_CONTENTS, INDEFINITE_LENGTH, MAX_HEADER_LEN, MIN_HEADER_LEN,
};
pub use error::{FrameError, MalformedReason, Result};
pub use reader::{read_element, ElementReader};
pub use tag::{tag_name, TagClass};
pub use writer::ElementWriter;
