use crate::error::{ChannelError, Result};

/// Fixed-capacity byte ring buffer.
///
/// Capacity is set once at construction. `push` accepts the prefix of the
/// input that fits and `pop` drains in FIFO order; both copy in at most two
/// contiguous segments.
pub struct RingBuffer {
    storage: Box<[u8]>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Allocate a ring buffer holding up to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| ChannelError::Alloc {
                requested: capacity,
            })?;
        storage.resize(capacity, 0);
        Ok(Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Free space.
    pub fn window(&self) -> usize {
        self.capacity() - self.len
    }

    /// Append as much of `data` as fits. Returns the number of bytes stored.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.window());
        if n == 0 {
            return 0;
        }

        let cap = self.capacity();
        let tail = (self.head + self.len) % cap;
        let first = n.min(cap - tail);
        self.storage[tail..tail + first].copy_from_slice(&data[..first]);
        self.storage[..n - first].copy_from_slice(&data[first..n]);

        self.len += n;
        n
    }

    /// Drain up to `out.len()` bytes. Returns the number of bytes copied.
    pub fn pop(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        if n == 0 {
            return 0;
        }

        let cap = self.capacity();
        let first = n.min(cap - self.head);
        out[..first].copy_from_slice(&self.storage[self.head..self.head + first]);
        out[first..n].copy_from_slice(&self.storage[..n - first]);

        self.head = (self.head + n) % cap;
        self.len -= n;
        if self.len == 0 {
            self.head = 0;
        }
        n
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .field("head", &self.head)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_accepts_prefix_that_fits() {
        let mut ring = RingBuffer::with_capacity(4).unwrap();
        assert_eq!(ring.push(b"abcdef"), 4);
        assert!(ring.is_full());
        assert_eq!(ring.push(b"g"), 0);
    }

    #[test]
    fn pop_drains_in_order() {
        let mut ring = RingBuffer::with_capacity(8).unwrap();
        ring.push(b"hello");

        let mut out = [0u8; 3];
        assert_eq!(ring.pop(&mut out), 3);
        assert_eq!(&out, b"hel");

        let mut out = [0u8; 8];
        assert_eq!(ring.pop(&mut out), 2);
        assert_eq!(&out[..2], b"lo");
        assert!(ring.is_empty());
    }

    #[test]
    fn wraps_around_storage_end() {
        let mut ring = RingBuffer::with_capacity(5).unwrap();
        ring.push(b"abc");

        let mut out = [0u8; 2];
        ring.pop(&mut out);
        assert_eq!(&out, b"ab");

        // head = 2, len = 1: "defg" lands as "de" at the end, "fg" at the front.
        assert_eq!(ring.push(b"defg"), 4);
        assert!(ring.is_full());

        let mut out = [0u8; 5];
        assert_eq!(ring.pop(&mut out), 5);
        assert_eq!(&out, b"cdefg");
    }

    #[test]
    fn window_tracks_len() {
        let mut ring = RingBuffer::with_capacity(10).unwrap();
        assert_eq!(ring.window(), 10);
        ring.push(b"1234");
        assert_eq!(ring.window(), 6);
        let mut out = [0u8; 1];
        ring.pop(&mut out);
        assert_eq!(ring.window(), 7);
        assert_eq!(ring.len() + ring.window(), ring.capacity());
    }

    #[test]
    fn clear_resets() {
        let mut ring = RingBuffer::with_capacity(3).unwrap();
        ring.push(b"xyz");
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.window(), 3);
    }

    #[test]
    fn zero_capacity_accepts_nothing() {
        let mut ring = RingBuffer::with_capacity(0).unwrap();
        assert_eq!(ring.push(b"a"), 0);
        let mut out = [0u8; 1];
        assert_eq!(ring.pop(&mut out), 0);
    }
}
