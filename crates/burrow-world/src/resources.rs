//! World-global singleton records.

use bytemuck::{Pod, Zeroable};

use burrow_arena::{Arena, ArenaConfig, Region};
use burrow_core::{Component, ResourceId};
use burrow_index::DisplacedSet;

/// Where a resource's bytes live. The zeroed slot marks an absent resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct ResourceSlot {
    region: Region,
    live: u32,
}

/// One record per resource kind.
///
/// Removed values pass through a scratch region sized to the largest
/// resource seen so far; the slot's own region is abandoned to the arena.
pub struct WorldResources {
    arena: Arena,
    slots: DisplacedSet<ResourceSlot>,
    discard: Region,
}

impl WorldResources {
    /// Create an empty resource table.
    pub fn new(config: ArenaConfig, capacity: usize) -> Self {
        let mut arena = Arena::new(config);
        let mut slots = DisplacedSet::new(ResourceSlot::zeroed());
        if capacity > 0 {
            slots.expand(&mut arena, capacity as u32 - 1);
        }
        Self {
            arena,
            slots,
            discard: Region::EMPTY,
        }
    }

    /// Store `value` as resource `id`, replacing any previous value.
    pub fn insert<R: Component>(&mut self, id: ResourceId, value: R) {
        let size = std::mem::size_of::<R>();
        let existing = self
            .slots
            .get(&self.arena, id.0)
            .map(|slot| slot.region)
            .filter(|region| region.len() == size);
        let region = match existing {
            Some(region) => region,
            None => self.arena.alloc(size),
        };
        self.arena
            .bytes_mut(region)
            .copy_from_slice(bytemuck::bytes_of(&value));
        self.slots.set(&mut self.arena, id.0, ResourceSlot { region, live: 1 });
        if size > self.discard.len() {
            self.discard = self.arena.alloc(size);
        }
    }

    /// Whether resource `id` is present.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.slots.contains(&self.arena, id.0)
    }

    /// The value of resource `id`.
    pub fn get<R: Component>(&self, id: ResourceId) -> Option<&R> {
        let slot = self.slots.get(&self.arena, id.0)?;
        Some(bytemuck::from_bytes(self.arena.bytes(slot.region)))
    }

    /// The value of resource `id`, mutably.
    pub fn get_mut<R: Component>(&mut self, id: ResourceId) -> Option<&mut R> {
        let region = self.slots.get(&self.arena, id.0)?.region;
        Some(bytemuck::from_bytes_mut(self.arena.bytes_mut(region)))
    }

    /// Remove resource `id`, returning its value.
    pub fn remove<R: Component>(&mut self, id: ResourceId) -> Option<R> {
        let slot = self.slots.remove(&mut self.arena, id.0)?;
        let size = slot.region.len();
        let scratch = self.discard.prefix(size);
        self.arena.copy_region(slot.region, scratch);
        Some(bytemuck::pod_read_unaligned(self.arena.bytes(scratch)))
    }

    /// Number of present resources.
    pub fn len(&self) -> usize {
        self.slots.count(&self.arena)
    }

    /// Whether no resource is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
