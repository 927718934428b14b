//! Non-blocking byte channel abstraction.
//!
//! A [`Channel`] is a byte stream with non-blocking read/write and two
//! control queries (write capacity, peer read demand). Implementations:
//! - [`PipeEndpoint`]: one end of a bounded, flow-controlled in-memory
//!   [`DuplexPipe`]
//! - [`MemoryBuffer`]: growable in-memory buffer
//! - [`StreamChannel`]: adapter over an already-connected std stream
//!
//! This is the lowest layer of streamprims. The element framing in
//! `streamprims-frame` reads from any of these.

pub mod error;
pub mod memory;
pub mod pipe;
pub mod ring;
pub mod stream;
pub mod traits;

pub use error::{ChannelError, Result};
pub use memory::MemoryBuffer;
pub use pipe::{pipe, DuplexPipe, PipeConfig, PipeEndpoint, Side, DEFAULT_PIPE_CAPACITY};
pub use ring::RingBuffer;
pub use stream::{HalfClose, StreamChannel};
pub use traits::Channel;
