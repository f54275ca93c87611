//! Reference counts for hidden relation entities.

use indexmap::{IndexMap, IndexSet};

use burrow_arena::{Arena, ArenaConfig};
use burrow_core::{EntityId, RelationTarget};
use burrow_index::CountedSet;

const NO_ENTITY: u32 = u32::MAX;

/// Maps each `(source, target)` pair to the hidden entity holding its
/// relation values, with one reference per relation kind on the pair.
///
/// A pair's relation entity exists exactly while its count is non-zero.
/// Sources whose `PERMANENT` flag was raised by their first relation are
/// remembered as pinned, so the flag can be dropped again with the last one.
pub struct WorldRelations {
    arena: Arena,
    by_source: IndexMap<EntityId, CountedSet<u32>>,
    pinned: IndexSet<EntityId>,
}

impl WorldRelations {
    /// Create an empty relation table.
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            arena: Arena::new(config),
            by_source: IndexMap::new(),
            pinned: IndexSet::new(),
        }
    }

    /// Whether `source` has at least one live relation entity.
    pub fn has_relations(&self, source: EntityId) -> bool {
        self.by_source
            .get(&source)
            .is_some_and(|set| set.iter(&self.arena).next().is_some())
    }

    /// Record that `source` is permanent only because of its relations.
    pub fn pin(&mut self, source: EntityId) {
        self.pinned.insert(source);
    }

    /// Forget `source`'s relation pin. Returns whether one was held.
    pub fn unpin(&mut self, source: EntityId) -> bool {
        self.pinned.swap_remove(&source)
    }

    /// The relation entity for `(source, target)`, if one is live.
    pub fn get(&self, source: EntityId, target: RelationTarget) -> Option<EntityId> {
        self.by_source
            .get(&source)?
            .get(&self.arena, target.key())
            .map(|&e| EntityId(e))
    }

    /// Number of relation kinds sharing the `(source, target)` entity.
    pub fn count(&self, source: EntityId, target: RelationTarget) -> u32 {
        self.by_source
            .get(&source)
            .map_or(0, |set| set.count(&self.arena, target.key()))
    }

    /// Add one reference from `(source, target)` to `relation`, returning
    /// the new count.
    pub fn retain(&mut self, source: EntityId, target: RelationTarget, relation: EntityId) -> u32 {
        self.by_source
            .entry(source)
            .or_insert_with(|| CountedSet::new(NO_ENTITY))
            .set(&mut self.arena, target.key(), relation.0)
    }

    /// Drop one reference from `(source, target)`.
    ///
    /// Returns the relation entity when this was the last reference and the
    /// caller must tear it down.
    pub fn release(&mut self, source: EntityId, target: RelationTarget) -> Option<EntityId> {
        let set = self.by_source.get_mut(&source)?;
        let relation = set.get(&self.arena, target.key()).copied()?;
        if set.remove(&mut self.arena, target.key()) == 1 {
            set.remove_all(&mut self.arena, target.key());
            Some(EntityId(relation))
        } else {
            None
        }
    }

    /// Forget every pair whose source is `source`, returning the relation
    /// entities that were live.
    pub fn remove_source(&mut self, source: EntityId) -> Vec<(RelationTarget, EntityId)> {
        let Some(mut set) = self.by_source.shift_remove(&source) else {
            return Vec::new();
        };
        let live: Vec<_> = set
            .iter(&self.arena)
            .map(|(key, &e, _)| (RelationTarget::from_key(key), EntityId(e)))
            .collect();
        set.clear(&mut self.arena);
        live
    }

    /// Live `(target, relation entity)` pairs for `source`.
    pub fn targets(&self, source: EntityId) -> Vec<(RelationTarget, EntityId)> {
        self.by_source.get(&source).map_or_else(Vec::new, |set| {
            set.iter(&self.arena)
                .map(|(key, &e, _)| (RelationTarget::from_key(key), EntityId(e)))
                .collect()
        })
    }
}
