//! Component/tag membership queries and their result cache.
//!
//! A [`Query`] names the component kinds an entity must have (whose
//! record locations are returned as columns) and the tag kinds it must
//! carry.
//! [`QueryContext::run`] answers it in one of three ways:
//!
//! - **Exact**: the same masks were answered before; the cached result is
//!   returned as is.
//! - **Refined**: a cached query of lower rank whose masks are subsets of
//!   this one exists; only its entities are re-checked.
//! - **Scanned**: the presence bitsets of every requested kind are
//!   intersected.
//!
//! The cache is never invalidated automatically. Clear or discard the
//! context after mutating the world.

use std::fmt;

use smallvec::SmallVec;

use burrow_arena::{Arena, ArenaConfig, List};
use burrow_core::{Component, ComponentId, EntityFlags, EntityId, KindMask, RelationTarget};
use burrow_index::HiBitSet;

use crate::registry::StorageClass;
use crate::storage::RecordLoc;
use crate::world::World;

/// Entities flagged with any of these never appear in query results.
const HIDDEN: EntityFlags = EntityFlags::PREFAB.union(EntityFlags::RELATION);

/// A membership predicate over component and tag kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    components: KindMask,
    tags: KindMask,
    requested: SmallVec<[ComponentId; 4]>,
}

impl Query {
    /// Build a query from raw kind identities. Components are returned as
    /// columns in the order given.
    pub fn from_kinds(
        components: impl IntoIterator<Item = ComponentId>,
        tags: impl IntoIterator<Item = ComponentId>,
    ) -> Self {
        let mut query = Self::default();
        for kind in components {
            query.push_component(kind);
        }
        for kind in tags {
            query.tags.insert(kind);
        }
        query
    }

    /// Required component kinds.
    pub fn components(&self) -> &KindMask {
        &self.components
    }

    /// Required tag kinds.
    pub fn tags(&self) -> &KindMask {
        &self.tags
    }

    /// Component kinds in column order.
    pub fn requested(&self) -> &[ComponentId] {
        &self.requested
    }

    /// Number of kinds the query constrains.
    pub fn rank(&self) -> usize {
        self.components.rank() + self.tags.rank()
    }

    /// Whether `other`'s constraints are a subset of this query's.
    pub fn subsumes(&self, other: &Query) -> bool {
        other.components.is_submask_of(&self.components) && other.tags.is_submask_of(&self.tags)
    }

    fn push_component(&mut self, kind: ComponentId) {
        if self.components.insert(kind) {
            self.requested.push(kind);
        }
    }
}

/// Typed construction of a [`Query`], registering kinds as needed.
pub struct QueryBuilder<'w> {
    world: &'w mut World,
    query: Query,
}

impl<'w> QueryBuilder<'w> {
    /// Require component `C` and return it as a column.
    pub fn with<C: Component>(mut self) -> Self {
        let kind = self.world.component_id::<C>();
        self.query.push_component(kind);
        self
    }

    /// Require tag `T`.
    pub fn with_tag<T: 'static>(mut self) -> Self {
        let kind = self.world.tag_id::<T>();
        self.query.tags.insert(kind);
        self
    }

    /// Require a `C` relation towards `target` and return its values as a
    /// column.
    pub fn with_relation<C: Component>(mut self, target: impl Into<RelationTarget>) -> Self {
        let kind = self.world.pair_id::<C>(target);
        self.query.push_component(kind);
        self
    }

    /// Require a `T` tag relation towards `target`.
    pub fn with_tag_relation<T: 'static>(mut self, target: impl Into<RelationTarget>) -> Self {
        let tag = self.world.tag_id::<T>();
        let kind = self.world.registry_mut().pair(tag, target.into());
        self.query.tags.insert(kind);
        self
    }

    /// Finish the query.
    pub fn build(self) -> Query {
        self.query
    }
}

impl World {
    /// Start building a query against this world's kinds.
    pub fn query(&mut self) -> QueryBuilder<'_> {
        QueryBuilder {
            world: self,
            query: Query::default(),
        }
    }
}

/// How [`QueryContext::run`] produced its result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Same masks answered before.
    Exact,
    /// Filtered from a cached lower-rank result.
    Refined,
    /// Full scan of the presence bitsets.
    Scanned,
}

struct Column {
    kind: ComponentId,
    holder_kind: ComponentId,
    records: List<RecordLoc>,
}

struct CacheEntry {
    components: KindMask,
    tags: KindMask,
    entities: List<EntityId>,
    columns: SmallVec<[Column; 4]>,
}

impl CacheEntry {
    fn key(&self) -> (&KindMask, &KindMask) {
        (&self.components, &self.tags)
    }
}

/// Cache of query results, bucketed by rank and sorted by mask.
pub struct QueryContext {
    arena: Arena,
    buckets: Vec<Vec<CacheEntry>>,
}

impl QueryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::with_config(ArenaConfig::default())
    }

    /// Create an empty context whose arena uses `config`.
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            arena: Arena::new(config),
            buckets: Vec::new(),
        }
    }

    /// Number of cached results.
    pub fn cached_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Drop every cached result and release their memory.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.arena.free();
    }

    /// Answer `query` against `world`, reusing cached results where valid.
    pub fn run<'c>(&'c mut self, world: &World, query: &Query) -> QueryResult<'c> {
        let rank = query.rank();
        if self.buckets.len() <= rank {
            self.buckets.resize_with(rank + 1, Vec::new);
        }
        let wanted = (&query.components, &query.tags);
        let (index, outcome) = match self.buckets[rank].binary_search_by(|e| e.key().cmp(&wanted)) {
            Ok(index) => (index, CacheOutcome::Exact),
            Err(index) => {
                let (entities, outcome) = match self.best_subsumed(query) {
                    Some(candidates) => (refine(world, query, candidates), CacheOutcome::Refined),
                    None => (scan(world, query), CacheOutcome::Scanned),
                };
                let entry = self.store(world, query, &entities);
                self.buckets[rank].insert(index, entry);
                (index, outcome)
            }
        };
        let entry = &self.buckets[rank][index];
        tracing::trace!(?outcome, rank, entities = entry.entities.len(), "query");
        QueryResult {
            arena: &self.arena,
            entry,
            requested: query.requested.clone(),
            outcome,
        }
    }

    /// Entities of the smallest cached result whose query this one subsumes.
    fn best_subsumed(&self, query: &Query) -> Option<Vec<EntityId>> {
        self.buckets
            .iter()
            .take(query.rank())
            .flatten()
            .filter(|e| e.components.is_submask_of(&query.components) && e.tags.is_submask_of(&query.tags))
            .min_by_key(|e| e.entities.len())
            .map(|e| e.entities.as_slice(&self.arena).to_vec())
    }

    fn store(&mut self, world: &World, query: &Query, entities: &[EntityId]) -> CacheEntry {
        let arena = &mut self.arena;
        let mut list = List::with_capacity(arena, entities.len());
        for &e in entities {
            list.push(arena, e);
        }
        let columns = query
            .components
            .kinds()
            .map(|kind| {
                let holder_kind = match world.registry().info(kind).class {
                    StorageClass::Indirect { source } => source,
                    _ => kind,
                };
                let mut records = List::with_capacity(arena, entities.len());
                for &e in entities {
                    let loc = world.locate(kind, e).unwrap_or(RecordLoc {
                        holder: e,
                        slot: RecordLoc::NO_SLOT,
                    });
                    records.push(arena, loc);
                }
                Column {
                    kind,
                    holder_kind,
                    records,
                }
            })
            .collect();
        CacheEntry {
            components: query.components.clone(),
            tags: query.tags.clone(),
            entities: list,
            columns,
        }
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("cached", &self.cached_count())
            .field("arena_bytes", &self.arena.used_bytes())
            .finish()
    }
}

fn matches(world: &World, query: &Query, entity: EntityId) -> bool {
    query
        .components
        .kinds()
        .chain(query.tags.kinds())
        .all(|kind| world.column(kind).is_some_and(|c| c.has(entity)))
}

fn refine(world: &World, query: &Query, candidates: Vec<EntityId>) -> Vec<EntityId> {
    candidates
        .into_iter()
        .filter(|&e| world.has_entity(e) && matches(world, query, e))
        .collect()
}

fn scan(world: &World, query: &Query) -> Vec<EntityId> {
    let kinds: SmallVec<[ComponentId; 8]> = query.components.kinds().chain(query.tags.kinds()).collect();
    let visible = |e: &EntityId| !world.flags(*e).intersects(HIDDEN);
    if kinds.is_empty() {
        let mut all: Vec<EntityId> = world.entities().filter(visible).collect();
        all.sort_unstable();
        return all;
    }
    let mut presences: SmallVec<[&HiBitSet; 8]> = SmallVec::new();
    for kind in kinds {
        match world.column(kind) {
            Some(column) => presences.push(column.presence()),
            None => return Vec::new(),
        }
    }
    HiBitSet::intersection_of(&presences)
        .iter()
        .map(EntityId)
        .filter(visible)
        .collect()
}

/// A borrowed view of a cached query result.
pub struct QueryResult<'c> {
    arena: &'c Arena,
    entry: &'c CacheEntry,
    requested: SmallVec<[ComponentId; 4]>,
    outcome: CacheOutcome,
}

impl<'c> QueryResult<'c> {
    /// How the result was produced.
    pub fn outcome(&self) -> CacheOutcome {
        self.outcome
    }

    /// Number of matching entities.
    pub fn len(&self) -> usize {
        self.entry.entities.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matching entities, in ascending identity order.
    pub fn entities(&self) -> &'c [EntityId] {
        self.entry.entities.as_slice(self.arena)
    }

    /// Record locations for `kind`, row-aligned with [`QueryResult::entities`].
    ///
    /// For a plain component the holder is the entity itself. For a
    /// relation pair it is the hidden relation entity, whose record lives
    /// in the relation component's storage (see [`QueryResult::holder_kind`]).
    pub fn column(&self, kind: ComponentId) -> Option<&'c [RecordLoc]> {
        self.find(kind).map(|c| c.records.as_slice(self.arena))
    }

    /// Kind whose storage holds the records of column `kind`.
    pub fn holder_kind(&self, kind: ComponentId) -> Option<ComponentId> {
        self.find(kind).map(|c| c.holder_kind)
    }

    /// Columns in the order the query requested them.
    pub fn columns(&self) -> impl Iterator<Item = (ComponentId, &'c [RecordLoc])> + '_ {
        self.requested
            .iter()
            .filter_map(move |&kind| self.column(kind).map(|records| (kind, records)))
    }

    /// Row `row` as a tuple of record locations, in requested column order.
    pub fn row(&self, row: usize) -> Option<(EntityId, SmallVec<[RecordLoc; 4]>)> {
        let entity = *self.entities().get(row)?;
        let locs = self.columns().map(|(_, records)| records[row]).collect();
        Some((entity, locs))
    }

    /// Row `row`'s `C` record, read straight from its dense slot.
    ///
    /// `world` must be the world the query ran against, unchanged since.
    pub fn get<'w, C: Component>(&self, world: &'w World, row: usize) -> Option<&'w C> {
        let kind = world.registry().lookup::<C>()?;
        self.get_in(world, kind, row)
    }

    /// Row `row`'s record in column `kind`, read as `C`. For a relation
    /// pair column `C` is the relation component.
    pub fn get_in<'w, C: Component>(&self, world: &'w World, kind: ComponentId, row: usize) -> Option<&'w C> {
        let column = self.find(kind)?;
        let loc = *column.records.as_slice(self.arena).get(row)?;
        world.record_at(column.holder_kind, loc)
    }

    fn find(&self, kind: ComponentId) -> Option<&'c Column> {
        self.entry.columns.iter().find(|c| c.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use bytemuck::{Pod, Zeroable};

    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct A(u32);

    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct B(u32);

    struct Marked;

    fn world() -> World {
        World::new(WorldConfig::new(16)).unwrap()
    }

    #[test]
    fn scan_then_exact() {
        let mut w = world();
        let e = w.add_entity();
        w.set_component(e, A(1));
        let q = w.query().with::<A>().build();
        let mut ctx = QueryContext::new();
        let first = ctx.run(&w, &q);
        assert_eq!(first.outcome(), CacheOutcome::Scanned);
        assert_eq!(first.entities(), &[e]);
        let second = ctx.run(&w, &q);
        assert_eq!(second.outcome(), CacheOutcome::Exact);
        assert_eq!(ctx.cached_count(), 1);
    }

    #[test]
    fn wider_query_refines_narrower() {
        let mut w = world();
        let e0 = w.add_entity();
        let e1 = w.add_entity();
        w.set_component(e0, A(0));
        w.set_component(e1, A(1));
        w.set_component(e1, B(1));
        let qa = w.query().with::<A>().build();
        let qab = w.query().with::<A>().with::<B>().build();
        let mut ctx = QueryContext::new();
        ctx.run(&w, &qa);
        let r = ctx.run(&w, &qab);
        assert_eq!(r.outcome(), CacheOutcome::Refined);
        assert_eq!(r.entities(), &[e1]);
        assert_eq!(r.get::<A>(&w, 0), Some(&A(1)));
        assert_eq!(r.get::<B>(&w, 0), Some(&B(1)));
    }

    #[test]
    fn narrower_after_wider_is_scanned() {
        let mut w = world();
        let e0 = w.add_entity();
        w.set_component(e0, A(0));
        let qa = w.query().with::<A>().build();
        let qab = w.query().with::<A>().with::<B>().build();
        let mut ctx = QueryContext::new();
        assert!(ctx.run(&w, &qab).is_empty());
        let r = ctx.run(&w, &qa);
        assert_eq!(r.outcome(), CacheOutcome::Scanned);
        assert_eq!(r.entities(), &[e0]);
    }

    #[test]
    fn tags_filter_without_columns() {
        let mut w = world();
        let e0 = w.add_entity();
        let e1 = w.add_entity();
        w.set_component(e0, A(0));
        w.set_component(e1, A(1));
        w.add_tag::<Marked>(e1);
        let q = w.query().with::<A>().with_tag::<Marked>().build();
        let mut ctx = QueryContext::new();
        let r = ctx.run(&w, &q);
        assert_eq!(r.entities(), &[e1]);
        assert_eq!(r.columns().count(), 1);
    }

    #[test]
    fn relation_columns_point_at_relation_entities() {
        let mut w = world();
        let src = w.add_entity();
        let dst = w.add_entity();
        w.set_component_relation(src, B(7), dst);
        let q = w.query().with_relation::<B>(dst).build();
        let pair = w.pair_id::<B>(dst);
        let b = w.component_id::<B>();
        let mut ctx = QueryContext::new();
        let r = ctx.run(&w, &q);
        assert_eq!(r.entities(), &[src]);
        let loc = r.column(pair).unwrap()[0];
        assert_eq!(Some(loc.holder), w.relation_entity(src, dst));
        assert_eq!(r.holder_kind(pair), Some(b));
        assert_eq!(r.get_in::<B>(&w, pair, 0), Some(&B(7)));
        assert_eq!(r.get::<B>(&w, 0), None, "src has no plain B column");
    }

    #[test]
    fn columns_hold_dense_slots_not_entity_ids() {
        let mut w = world();
        let ids: Vec<EntityId> = (0..4).map(|_| w.add_entity()).collect();
        for (i, &e) in ids.iter().enumerate().rev() {
            w.set_component(e, A(i as u32));
        }
        w.set_component(ids[2], B(0));
        let a = w.component_id::<A>();
        let q = w.query().with::<A>().with::<B>().build();
        let mut ctx = QueryContext::new();
        let r = ctx.run(&w, &q);
        let (entity, locs) = r.row(0).unwrap();
        assert_eq!(entity, ids[2]);
        assert_eq!(locs[0].slot, 1, "A records were inserted in reverse");
        assert_eq!(locs[0], w.locate(a, ids[2]).unwrap());
        assert_eq!(r.get::<A>(&w, 0), Some(&A(2)));
        assert!(r.row(1).is_none());
    }

    #[test]
    fn hidden_entities_are_skipped() {
        let mut w = world();
        let src = w.add_entity();
        let dst = w.add_entity();
        w.set_component_relation(src, B(1), dst);
        let prefab = w.add_entity();
        w.set_component(prefab, B(2));
        w.set_prefab(prefab);
        let q = w.query().with::<B>().build();
        let mut ctx = QueryContext::new();
        assert!(ctx.run(&w, &q).is_empty());
        let all = Query::default();
        assert_eq!(ctx.run(&w, &all).entities(), &[src, dst]);
    }

    #[test]
    fn clear_forgets_results() {
        let mut w = world();
        let e = w.add_entity();
        w.set_component(e, A(1));
        let q = w.query().with::<A>().build();
        let mut ctx = QueryContext::new();
        ctx.run(&w, &q);
        ctx.clear();
        assert_eq!(ctx.cached_count(), 0);
        assert_eq!(ctx.run(&w, &q).outcome(), CacheOutcome::Scanned);
    }

    #[test]
    fn columns_follow_requested_order() {
        let mut w = world();
        let e = w.add_entity();
        w.set_component(e, A(1));
        w.set_component(e, B(2));
        let a = w.component_id::<A>();
        let b = w.component_id::<B>();
        let q = Query::from_kinds([b, a], []);
        let mut ctx = QueryContext::new();
        let kinds: Vec<ComponentId> = ctx.run(&w, &q).columns().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![b, a]);
    }
}
