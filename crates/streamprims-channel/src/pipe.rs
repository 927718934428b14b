//! Bounded in-memory duplex pipe.
//!
//! Behaves like a connected socket pair: each endpoint writes into one ring
//! buffer and reads from the other. Both buffers and their shutdown state
//! live in one shared [`DuplexPipe`]; endpoints hold a handle to it plus the
//! [`Side`] they play, never a reference to each other.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::{ChannelError, Result};
use crate::ring::RingBuffer;
use crate::traits::Channel;

/// Default per-direction capacity: 17 KiB.
pub const DEFAULT_PIPE_CAPACITY: usize = 17 * 1024;

/// Which end of a pipe an endpoint is.
///
/// `A` writes the a-to-b direction and reads b-to-a; `B` the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The opposite end.
    pub fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

/// Configuration for a duplex pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Capacity of the buffer written by `A`. 0 selects the default.
    pub capacity_a_to_b: usize,
    /// Capacity of the buffer written by `B`. 0 selects the default.
    pub capacity_b_to_a: usize,
}

impl PipeConfig {
    /// Same capacity in both directions.
    pub fn symmetric(capacity: usize) -> Self {
        Self {
            capacity_a_to_b: capacity,
            capacity_b_to_a: capacity,
        }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self::symmetric(DEFAULT_PIPE_CAPACITY)
    }
}

/// One direction of the pipe.
#[derive(Debug)]
struct Direction {
    ring: RingBuffer,
    write_shutdown: bool,
    reader_alive: bool,
    /// Bytes the reader still wants after its last short read.
    demand: usize,
}

impl Direction {
    fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            ring: RingBuffer::with_capacity(capacity)?,
            write_shutdown: false,
            reader_alive: true,
            demand: 0,
        })
    }

    fn writable(&self) -> bool {
        !self.write_shutdown && self.reader_alive
    }
}

/// Shared state of a duplex pipe.
///
/// Never handled directly; [`DuplexPipe::create`] returns the two
/// [`PipeEndpoint`]s that share it.
#[derive(Debug)]
pub struct DuplexPipe {
    a_to_b: Direction,
    b_to_a: Direction,
}

impl DuplexPipe {
    /// Create a connected endpoint pair with per-direction capacities.
    ///
    /// A capacity of 0 selects [`DEFAULT_PIPE_CAPACITY`]. Fails only if the
    /// buffers cannot be allocated.
    pub fn create(
        capacity_a_to_b: usize,
        capacity_b_to_a: usize,
    ) -> Result<(PipeEndpoint, PipeEndpoint)> {
        let capacity_a_to_b = effective_capacity(capacity_a_to_b);
        let capacity_b_to_a = effective_capacity(capacity_b_to_a);

        let shared = Arc::new(Mutex::new(DuplexPipe {
            a_to_b: Direction::with_capacity(capacity_a_to_b)?,
            b_to_a: Direction::with_capacity(capacity_b_to_a)?,
        }));

        debug!(capacity_a_to_b, capacity_b_to_a, "created duplex pipe");

        Ok((
            PipeEndpoint {
                shared: Arc::clone(&shared),
                side: Side::A,
            },
            PipeEndpoint {
                shared,
                side: Side::B,
            },
        ))
    }

    /// Create a connected endpoint pair from a [`PipeConfig`].
    pub fn with_config(config: PipeConfig) -> Result<(PipeEndpoint, PipeEndpoint)> {
        Self::create(config.capacity_a_to_b, config.capacity_b_to_a)
    }

    /// Direction written by `side`.
    fn outbound(&mut self, side: Side) -> &mut Direction {
        match side {
            Side::A => &mut self.a_to_b,
            Side::B => &mut self.b_to_a,
        }
    }

    /// Direction read by `side`.
    fn inbound(&mut self, side: Side) -> &mut Direction {
        self.outbound(side.peer())
    }
}

/// Create a connected endpoint pair with the same capacity both ways.
pub fn pipe(capacity: usize) -> Result<(PipeEndpoint, PipeEndpoint)> {
    DuplexPipe::create(capacity, capacity)
}

fn effective_capacity(capacity: usize) -> usize {
    if capacity == 0 {
        DEFAULT_PIPE_CAPACITY
    } else {
        capacity
    }
}

/// One end of a [`DuplexPipe`].
///
/// Dropping an endpoint shuts down its write direction, so the peer drains
/// what is left and then sees end-of-data. It also leaves the other
/// direction without a reader, so the peer's further writes fail with
/// `BrokenPipe`.
pub struct PipeEndpoint {
    shared: Arc<Mutex<DuplexPipe>>,
    side: Side,
}

impl PipeEndpoint {
    fn lock(&self) -> MutexGuard<'_, DuplexPipe> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Bytes waiting for this endpoint to read.
    pub fn buffered(&self) -> usize {
        self.lock().inbound(self.side).ring.len()
    }

    /// Bytes this endpoint wrote that the peer has not read yet.
    pub fn in_flight(&self) -> usize {
        self.lock().outbound(self.side).ring.len()
    }

    /// Total capacity of the direction this endpoint writes.
    pub fn capacity(&self) -> usize {
        self.lock().outbound(self.side).ring.capacity()
    }

    /// Whether this endpoint's write direction has been shut down.
    pub fn is_write_shutdown(&self) -> bool {
        self.lock().outbound(self.side).write_shutdown
    }

    /// Whether the peer has shut down its write direction (this endpoint
    /// will see end-of-data once [`buffered`](Self::buffered) reaches 0).
    pub fn is_peer_write_shutdown(&self) -> bool {
        self.lock().inbound(self.side).write_shutdown
    }
}

impl Channel for PipeEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let side = self.side;
        let mut shared = self.lock();
        let dir = shared.inbound(side);

        if dir.ring.is_empty() {
            if dir.write_shutdown {
                dir.demand = 0;
                return Ok(0);
            }
            dir.demand = buf.len().min(dir.ring.capacity());
            trace!(side = side.as_str(), demand = dir.demand, "pipe read would block");
            return Err(ChannelError::WouldBlock);
        }

        let n = dir.ring.pop(buf);
        dir.demand = if n < buf.len() && !dir.write_shutdown {
            (buf.len() - n).min(dir.ring.capacity())
        } else {
            0
        };
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let side = self.side;
        let mut shared = self.lock();
        let dir = shared.outbound(side);

        if !dir.writable() {
            return Err(ChannelError::BrokenPipe);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let n = dir.ring.push(buf);
        if n == 0 {
            trace!(side = side.as_str(), len = buf.len(), "pipe write would block");
            return Err(ChannelError::WouldBlock);
        }
        dir.demand = dir.demand.saturating_sub(n);
        Ok(n)
    }

    fn query_write_capacity(&self) -> usize {
        self.lock().outbound(self.side).ring.window()
    }

    fn query_read_demand(&self) -> usize {
        self.lock().outbound(self.side).demand
    }

    fn shutdown_write(&mut self) -> Result<()> {
        let side = self.side;
        let mut shared = self.lock();
        let dir = shared.outbound(side);
        if !dir.write_shutdown {
            dir.write_shutdown = true;
            dir.demand = 0;
            debug!(
                side = side.as_str(),
                buffered = dir.ring.len(),
                "pipe write direction shut down"
            );
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "duplex-pipe"
    }
}

impl io::Read for PipeEndpoint {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Channel::read(self, buf).map_err(Into::into)
    }
}

impl io::Write for PipeEndpoint {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Channel::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeEndpoint {
    fn drop(&mut self) {
        let side = self.side;
        let mut shared = self.lock();

        let out = shared.outbound(side);
        out.write_shutdown = true;
        out.demand = 0;

        let inb = shared.inbound(side);
        inb.reader_alive = false;
        inb.demand = 0;
        let discarded = inb.ring.len();
        inb.ring.clear();

        debug!(side = side.as_str(), discarded, "pipe endpoint dropped");
    }
}

impl std::fmt::Debug for PipeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeEndpoint")
            .field("side", &self.side)
            .finish()
    }
}
