//! Live entity identities and the recycling queue.

use burrow_arena::{Arena, ArenaConfig, Queue};
use burrow_core::EntityId;
use burrow_index::PagedSparseSet;

/// Tracks which identities are alive and which may be reused.
///
/// Removed identities go to the back of a FIFO queue and are handed out
/// again, oldest first, before any fresh identity is minted.
pub struct WorldEntities {
    arena: Arena,
    alive: PagedSparseSet<u32>,
    free: Queue<u32>,
    next: u32,
}

impl WorldEntities {
    /// Create an empty table whose first arena block fits `capacity` ids.
    pub fn new(config: ArenaConfig, capacity: usize) -> Self {
        let bytes = capacity * std::mem::size_of::<u32>() * 3;
        Self {
            arena: Arena::with_capacity(config, bytes),
            alive: PagedSparseSet::integer(|id: &u32| *id),
            free: Queue::new(),
            next: 0,
        }
    }

    /// Allocate an identity, recycling the oldest freed one if any.
    pub fn create(&mut self) -> EntityId {
        let id = match self.free.pop_front(&mut self.arena) {
            Some(id) => {
                tracing::trace!(entity = id, "recycled entity id");
                id
            }
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        };
        self.alive.set(&mut self.arena, id, id);
        EntityId(id)
    }

    /// Retire `entity`, queueing its identity for reuse.
    /// Returns whether it was alive.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        if self.alive.remove(&mut self.arena, entity.0).is_none() {
            return false;
        }
        self.free.push_back(&mut self.arena, entity.0);
        true
    }

    /// Whether `entity` is alive.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.alive.contains(&self.arena, entity.0)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Whether no entity is alive.
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Number of identities waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Live entities, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive.keys(&self.arena).map(EntityId)
    }
}
