//! Arena blocks and their backing buffers.
//!
//! A [`Block`] is a bump-allocated window over a backing buffer. Blocks
//! appended by the arena own their buffer; blocks carved off the tail of
//! another block borrow the same buffer.

use bytemuck::{Pod, Zeroable};

/// Alignment of every backing buffer.
pub(crate) const CHUNK_ALIGN: usize = 16;

/// Unit of backing storage. Buffers are `Vec<Chunk>`, which pins their
/// base address to a 16-byte boundary.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(16))]
pub(crate) struct Chunk([u8; CHUNK_ALIGN]);

/// Allocate a zeroed buffer of at least `bytes` bytes.
pub(crate) fn new_buffer(bytes: usize) -> Vec<Chunk> {
    vec![Chunk::zeroed(); bytes.div_ceil(CHUNK_ALIGN)]
}

/// One link in the arena's block chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Index of the backing buffer.
    pub(crate) buffer: u32,
    /// Byte offset of this block within its buffer.
    pub(crate) base: usize,
    /// Capacity in bytes.
    pub(crate) capacity: usize,
    /// Bytes handed out so far, including alignment padding.
    pub(crate) used: usize,
    /// Whether this block owns its buffer (false for carved tails).
    pub(crate) owned: bool,
}

impl Block {
    pub(crate) fn owned(buffer: u32, capacity: usize) -> Self {
        Self {
            buffer,
            base: 0,
            capacity,
            used: 0,
            owned: true,
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Remaining free capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    /// Whether this block owns its backing buffer.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Absolute offset of the bump pointer.
    pub(crate) fn cursor(&self) -> usize {
        self.base + self.used
    }

    /// Absolute offset one past the last byte of this block.
    pub(crate) fn limit(&self) -> usize {
        self.base + self.capacity
    }

    /// Absolute offset an allocation of `size` at `align` would start at,
    /// if it fits.
    pub(crate) fn fit(&self, size: usize, align: usize) -> Option<usize> {
        let start = self.cursor().next_multiple_of(align);
        let end = start.checked_add(size)?;
        (end <= self.limit()).then_some(start)
    }

    /// Bump-allocate `size` bytes at `align`. Returns the absolute offset.
    pub(crate) fn alloc(&mut self, size: usize, align: usize) -> Option<usize> {
        let start = self.fit(size, align)?;
        self.used = start + size - self.base;
        Some(start)
    }

    /// Whether the absolute byte range `[start, end)` lies inside this block.
    pub(crate) fn covers(&self, buffer: u32, start: usize, end: usize) -> bool {
        self.buffer == buffer && self.base <= start && end <= self.limit()
    }

    /// Split this block at absolute offset `at`, returning the tail.
    ///
    /// The head keeps `[base, at)` and is left full; the tail is a
    /// borrowed view of `[at, limit)` that inherits whatever was already
    /// allocated past `at`.
    pub(crate) fn carve(&mut self, at: usize) -> Block {
        debug_assert!(self.base <= at && at <= self.limit());
        let tail = Block {
            buffer: self.buffer,
            base: at,
            capacity: self.limit() - at,
            used: self.cursor().saturating_sub(at),
            owned: false,
        };
        self.capacity = at - self.base;
        self.used = self.used.min(self.capacity);
        tail
    }
}
