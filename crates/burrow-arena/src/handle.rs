//! Region handles.
//!
//! A [`Region`] names a byte range inside one arena buffer. It is
//! generation-scoped: the arena bumps its generation on `free()`, and any
//! region minted before that is rejected on resolve.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use burrow_core::Violation;

/// Location of an allocation within an [`Arena`](crate::Arena).
///
/// Handles address a buffer and an absolute byte offset inside it rather
/// than a block, so carving a block in two never invalidates a region.
/// Being plain data, regions can themselves be stored in arena-backed
/// containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
#[must_use]
pub struct Region {
    /// Index of the backing buffer.
    pub(crate) buffer: u32,
    /// Byte offset from the start of the buffer.
    pub(crate) offset: u32,
    /// Length of the allocation in bytes.
    pub(crate) len: u32,
    /// Arena generation when this allocation was made.
    pub(crate) generation: u32,
}

impl Region {
    /// The zero-length region. Never resolves to arena memory.
    pub const EMPTY: Region = Region {
        buffer: u32::MAX,
        offset: 0,
        len: 0,
        generation: 0,
    };

    pub(crate) fn new(buffer: u32, offset: u32, len: u32, generation: u32) -> Self {
        Self {
            buffer,
            offset,
            len,
            generation,
        }
    }

    /// Length of the allocation in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether this is a zero-length allocation.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The arena generation this region belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Absolute end offset within the buffer.
    pub(crate) fn end(&self) -> usize {
        self.offset as usize + self.len as usize
    }

    /// The first `len` bytes of this region.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::OutOfBounds`] if `len` exceeds the region.
    pub fn prefix(self, len: usize) -> Self {
        if len > self.len as usize {
            Violation::OutOfBounds {
                index: len,
                len: self.len as usize,
            }
            .raise();
        }
        self.with_len(len)
    }

    pub(crate) fn with_len(self, len: usize) -> Self {
        Self {
            len: len as u32,
            ..self
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region(gen={}, buf={}, off={}, len={})",
            self.generation, self.buffer, self.offset, self.len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region() {
        assert!(Region::EMPTY.is_empty());
        assert_eq!(Region::default(), Region::EMPTY);
    }

    #[test]
    fn end_is_offset_plus_len() {
        let r = Region::new(0, 32, 16, 1);
        assert_eq!(r.end(), 48);
        assert_eq!(r.with_len(4).end(), 36);
        assert_eq!(r.generation(), 1);
    }

    #[test]
    fn prefix_keeps_start() {
        let r = Region::new(2, 64, 16, 0);
        let p = r.prefix(8);
        assert_eq!(p.len(), 8);
        assert_eq!(p.end(), 72);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn prefix_past_end_panics() {
        let _ = Region::new(0, 0, 4, 0).prefix(5);
    }
}
