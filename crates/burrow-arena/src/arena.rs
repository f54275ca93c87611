//! The block-chained bump arena.

use bytemuck::Pod;
use burrow_core::Violation;

use crate::block::{new_buffer, Block, Chunk};
use crate::config::ArenaConfig;
use crate::handle::Region;

/// Which tier of the reallocation policy satisfied a `realloc`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReallocStrategy {
    /// The region was extended or shrunk where it lies.
    InPlace,
    /// The region's block was carved at the region's end, then the region
    /// was moved to fresh space.
    Split,
    /// The region was moved into another block with enough room.
    Fit,
    /// The region was moved into a newly appended block.
    New,
}

/// Bump allocator over an ordered chain of blocks.
///
/// Allocation is first-fit across the chain. When nothing fits, a block of
/// `max(block_size, request, last block capacity)` bytes is appended, so
/// allocation never fails short of process-level memory exhaustion.
///
/// There is no per-region free. [`Arena::free`] releases everything at once
/// and bumps the generation so outstanding [`Region`]s are rejected.
pub struct Arena {
    config: ArenaConfig,
    /// Owned backing memory; blocks are views into these.
    buffers: Vec<Vec<Chunk>>,
    /// The block chain, in allocation-search order.
    blocks: Vec<Block>,
    generation: u32,
}

impl Arena {
    /// Create an empty arena. No memory is reserved until the first allocation.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`ArenaConfig::validate`].
    pub fn new(config: ArenaConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid arena config: {e}");
        }
        Self {
            config,
            buffers: Vec::new(),
            blocks: Vec::new(),
            generation: 0,
        }
    }

    /// Create an arena whose first block holds at least `bytes` bytes.
    pub fn with_capacity(config: ArenaConfig, bytes: usize) -> Self {
        let mut arena = Self::new(config);
        if bytes > 0 {
            arena.append_block(bytes);
        }
        arena
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Allocate `size` zero-or-stale bytes. Zero-size requests return
    /// [`Region::EMPTY`] without touching any block.
    pub fn alloc(&mut self, size: usize) -> Region {
        if size == 0 {
            return Region::EMPTY;
        }
        let align = self.config.align_for(size);
        for block in &mut self.blocks {
            if let Some(offset) = block.alloc(size, align) {
                return Region::new(block.buffer, offset as u32, size as u32, self.generation);
            }
        }
        // Fresh blocks start at a buffer's aligned base and hold `size`.
        let index = self.append_block(size);
        let block = &mut self.blocks[index];
        block.used = size;
        Region::new(block.buffer, 0, size as u32, self.generation)
    }

    /// Resize `region` to `new_size` bytes, preserving its first
    /// `min(region.len(), new_size)` bytes.
    ///
    /// The returned handle replaces `region`; the old handle may still
    /// resolve but its bytes are no longer owned by the caller.
    pub fn realloc(&mut self, region: Region, new_size: usize) -> Region {
        self.realloc_with_strategy(region, new_size).0
    }

    /// [`Arena::realloc`], also reporting which policy tier was used.
    ///
    /// Tiers, in priority order:
    ///
    /// 1. **in place**: shrinking, or growing the most recent allocation of
    ///    a block with enough trailing capacity;
    /// 2. **split**: some block can hold the new size, and the region is at
    ///    least a quarter of its own block: the block is carved at the
    ///    region's end so its tail stays usable, then the region moves;
    /// 3. **fit**: move into the first block with room;
    /// 4. **new**: move into a freshly appended block.
    ///
    /// Reallocating [`Region::EMPTY`] is a plain allocation and reports `New`
    /// or `Fit` depending on where the bytes landed.
    pub fn realloc_with_strategy(
        &mut self,
        region: Region,
        new_size: usize,
    ) -> (Region, ReallocStrategy) {
        if region.is_empty() {
            let had_room = self.first_fit(new_size).is_some();
            let fresh = self.alloc(new_size);
            let strategy = if had_room || new_size == 0 {
                ReallocStrategy::Fit
            } else {
                ReallocStrategy::New
            };
            return (fresh, strategy);
        }
        self.check(region);

        let home = self.home_block(region);
        if new_size <= region.len() {
            let block = &mut self.blocks[home];
            if block.cursor() == region.end() {
                block.used -= region.len() - new_size;
            }
            let shrunk = if new_size == 0 {
                Region::EMPTY
            } else {
                region.with_len(new_size)
            };
            return (shrunk, ReallocStrategy::InPlace);
        }

        let block = &mut self.blocks[home];
        if block.cursor() == region.end() && region.offset as usize + new_size <= block.limit() {
            block.used += new_size - region.len();
            return (region.with_len(new_size), ReallocStrategy::InPlace);
        }

        let strategy = match self.first_fit(new_size) {
            Some(_) if region.len() * 4 >= self.blocks[home].capacity() => {
                self.carve(home, region.end());
                ReallocStrategy::Split
            }
            Some(_) => ReallocStrategy::Fit,
            None => ReallocStrategy::New,
        };
        let moved = self.alloc(new_size);
        self.copy(region, moved, region.len());
        tracing::trace!(%region, %moved, ?strategy, "arena realloc moved region");
        (moved, strategy)
    }

    /// Release every block and invalidate all outstanding regions.
    pub fn free(&mut self) {
        tracing::debug!(
            blocks = self.blocks.len(),
            bytes = self.capacity_bytes(),
            generation = self.generation,
            "arena freed"
        );
        self.blocks.clear();
        self.buffers.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Resolve a region to its bytes.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::StaleRegion`] if the region predates the
    /// last [`Arena::free`].
    pub fn bytes(&self, region: Region) -> &[u8] {
        if region.is_empty() {
            return &[];
        }
        self.check(region);
        let buffer: &[u8] = bytemuck::cast_slice(self.buffers[region.buffer as usize].as_slice());
        &buffer[region.offset as usize..region.end()]
    }

    /// Resolve a region to its bytes, mutably.
    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        if region.is_empty() {
            return &mut [];
        }
        self.check(region);
        let buffer: &mut [u8] = bytemuck::cast_slice_mut(self.buffers[region.buffer as usize].as_mut_slice());
        &mut buffer[region.offset as usize..region.end()]
    }

    /// Copy `from`'s bytes to the start of `to` without an intermediate
    /// buffer.
    ///
    /// # Panics
    ///
    /// Panics if `to` is shorter than `from`, or with
    /// [`Violation::StaleRegion`] if either region is stale.
    pub fn copy_region(&mut self, from: Region, to: Region) {
        assert!(
            to.len() >= from.len(),
            "copy target {to} is shorter than source {from}"
        );
        if from.is_empty() {
            return;
        }
        self.check(from);
        self.check(to);
        self.copy(from, to, from.len());
    }

    /// Resolve a region as a slice of `T`.
    ///
    /// The region must have been allocated with a length that is a multiple
    /// of `size_of::<T>()`; the alignment rule guarantees the cast.
    pub fn slice<T: Pod>(&self, region: Region) -> &[T] {
        if region.is_empty() {
            return &[];
        }
        bytemuck::cast_slice(self.bytes(region))
    }

    /// Resolve a region as a mutable slice of `T`.
    pub fn slice_mut<T: Pod>(&mut self, region: Region) -> &mut [T] {
        if region.is_empty() {
            return &mut [];
        }
        bytemuck::cast_slice_mut(self.bytes_mut(region))
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The block chain, in search order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total block capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.blocks.iter().map(Block::capacity).sum()
    }

    /// Total bytes handed out, including padding and abandoned regions.
    pub fn used_bytes(&self) -> usize {
        self.blocks.iter().map(Block::used).sum()
    }

    /// Current generation. Incremented by every [`Arena::free`].
    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn check(&self, region: Region) {
        if region.generation != self.generation {
            Violation::StaleRegion {
                region_generation: region.generation,
                arena_generation: self.generation,
            }
            .raise();
        }
    }

    fn first_fit(&self, size: usize) -> Option<usize> {
        let align = self.config.align_for(size);
        self.blocks.iter().position(|b| b.fit(size, align).is_some())
    }

    fn home_block(&self, region: Region) -> usize {
        self.blocks
            .iter()
            .position(|b| b.covers(region.buffer, region.offset as usize, region.end()))
            .unwrap_or_else(|| {
                Violation::StaleRegion {
                    region_generation: region.generation,
                    arena_generation: self.generation,
                }
                .raise()
            })
    }

    fn append_block(&mut self, request: usize) -> usize {
        let previous = self.blocks.last().map_or(0, Block::capacity);
        let capacity = self
            .config
            .block_size
            .max(request)
            .max(previous)
            .next_multiple_of(self.config.max_align);
        let buffer = self.buffers.len() as u32;
        self.buffers.push(new_buffer(capacity));
        self.blocks.push(Block::owned(buffer, capacity));
        tracing::debug!(capacity, blocks = self.blocks.len(), "arena appended block");
        self.blocks.len() - 1
    }

    fn carve(&mut self, index: usize, at: usize) {
        if at >= self.blocks[index].limit() {
            return;
        }
        let tail = self.blocks[index].carve(at);
        tracing::debug!(
            head = self.blocks[index].capacity(),
            tail = tail.capacity(),
            "arena carved block"
        );
        self.blocks.insert(index + 1, tail);
    }

    fn copy(&mut self, from: Region, to: Region, len: usize) {
        let (src, dst) = (from.offset as usize, to.offset as usize);
        if from.buffer == to.buffer {
            let buffer: &mut [u8] = bytemuck::cast_slice_mut(self.buffers[from.buffer as usize].as_mut_slice());
            buffer.copy_within(src..src + len, dst);
            return;
        }
        let (a, b) = (from.buffer as usize, to.buffer as usize);
        let (source, target) = if a < b {
            let (left, right) = self.buffers.split_at_mut(b);
            (&left[a], &mut right[0])
        } else {
            let (left, right) = self.buffers.split_at_mut(a);
            (&right[0], &mut left[b])
        };
        let source: &[u8] = bytemuck::cast_slice(source.as_slice());
        let target: &mut [u8] = bytemuck::cast_slice_mut(target.as_mut_slice());
        target[dst..dst + len].copy_from_slice(&source[src..src + len]);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}
