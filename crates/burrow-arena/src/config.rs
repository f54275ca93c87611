//! Arena configuration parameters.

use burrow_core::ConfigError;

use crate::block::CHUNK_ALIGN;

/// Configuration for the arena allocator.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Minimum capacity of each appended block, in bytes.
    ///
    /// Default: 65_536. Must be a non-zero multiple of `max_align`.
    pub block_size: usize,

    /// Largest alignment any allocation is padded to, in bytes.
    ///
    /// Default: 16. Must be a power of two no larger than the alignment
    /// of the backing buffers, and at least the alignment of any record
    /// stored through a typed view.
    pub max_align: usize,
}

impl ArenaConfig {
    /// Default block size: 64KB.
    pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

    /// Largest supported alignment.
    pub const MAX_ALIGN: usize = CHUNK_ALIGN;

    /// Create a config with the given block size and the default alignment.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            max_align: Self::MAX_ALIGN,
        }
    }

    /// Check all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_align == 0
            || !self.max_align.is_power_of_two()
            || self.max_align > Self::MAX_ALIGN
        {
            return Err(ConfigError::InvalidAlignment {
                max_align: self.max_align,
            });
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.block_size % self.max_align != 0 {
            return Err(ConfigError::UnalignedBlockSize {
                block_size: self.block_size,
                max_align: self.max_align,
            });
        }
        Ok(())
    }

    /// Alignment applied to an allocation of `size` bytes.
    ///
    /// The largest power of two that is `<= min(size, max_align)`. Any
    /// plain-old-data type whose alignment is at most `max_align` is
    /// correctly aligned by this rule, because its size is a multiple of
    /// its alignment.
    pub fn align_for(&self, size: usize) -> usize {
        let cap = size.min(self.max_align).max(1);
        1usize << (usize::BITS - 1 - cap.leading_zeros())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
