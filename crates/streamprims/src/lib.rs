//! Non-blocking byte channels and streaming element framing.
//!
//! streamprims provides a small set of byte-stream primitives: a channel
//! trait with explicit backpressure, a bounded duplex in-memory pipe, and a
//! reader that pulls one complete BER/DER-style TLV element off any channel.
//!
//! # Crate Structure
//!
//! - [`channel`]: `Channel` trait, duplex pipe, memory buffer, stream adapter
//! - [`frame`]: TLV header codec, element reader and writer

/// Re-export channel types.
pub mod channel {
    pub use streamprims_channel::*;
}

/// Re-export frame types.
pub mod frame {
    pub use streamprims_frame::*;
}
