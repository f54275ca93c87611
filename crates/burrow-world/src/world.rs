//! The world façade.
//!
//! [`World`] composes the entity, component, relation, and resource layers
//! and enforces the lifecycle rules:
//!
//! - every operation on an entity requires it to be alive;
//! - components and tags of an immutable entity cannot change;
//! - a permanent entity cannot be removed;
//! - a relation entity lives exactly as long as some relation kind on its
//!   `(source, target)` pair references it;
//! - a source is pinned permanent while it has relation entities, unless
//!   it was already permanent when the first one was created.
//!
//! Violations panic with a [`Violation`] diagnostic.

use burrow_core::{
    Checksum, Component, ComponentId, ConfigError, EntityFlags, EntityId, RelationTarget,
    ResourceId, Violation,
};

use crate::components::WorldComponents;
use crate::config::WorldConfig;
use crate::entities::WorldEntities;
use crate::registry::{Registry, StorageClass};
use crate::relations::WorldRelations;
use crate::resources::WorldResources;
use crate::storage::{ComponentColumn, RecordLoc};

/// An entity/component store.
pub struct World {
    config: WorldConfig,
    registry: Registry,
    entities: WorldEntities,
    components: WorldComponents,
    relations: WorldRelations,
    resources: WorldResources,
    flags_kind: ComponentId,
}

impl World {
    /// Create a world after validating `config`.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut registry = Registry::with_capacity(config.component_capacity, config.resource_capacity);
        let mut components = WorldComponents::new(config.arena.clone(), config.component_capacity);
        let flags_kind = registry.component::<EntityFlags>();
        components.ensure::<EntityFlags>(registry.info(flags_kind));
        tracing::debug!(
            entity_capacity = config.entity_capacity,
            component_capacity = config.component_capacity,
            resource_capacity = config.resource_capacity,
            block_size = config.arena.block_size,
            "world created"
        );
        Ok(Self {
            entities: WorldEntities::new(config.arena.clone(), config.entity_capacity),
            relations: WorldRelations::new(config.arena.clone()),
            resources: WorldResources::new(config.arena.clone(), config.resource_capacity),
            config,
            registry,
            components,
            flags_kind,
        })
    }

    /// The configuration the world was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The kind registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The erased storage for `kind`, if it has been created.
    pub fn column(&self, kind: ComponentId) -> Option<&dyn ComponentColumn> {
        self.components.column(kind)
    }

    /// Where `entity`'s value for `kind` lives: the kind holding the record
    /// and the entity it is keyed by.
    pub fn resolve(&self, kind: ComponentId, entity: EntityId) -> Option<(ComponentId, EntityId)> {
        self.components.resolve(kind, entity)
    }

    /// Location of `entity`'s record for `kind`, following relation pairs
    /// to the relation entity that holds the value.
    pub fn locate(&self, kind: ComponentId, entity: EntityId) -> Option<RecordLoc> {
        let (holder_kind, holder) = self.components.resolve(kind, entity)?;
        let slot = self.components.slot(holder_kind, holder)?;
        Some(RecordLoc { holder, slot })
    }

    /// The `C` record at `loc` in `kind`'s storage, read by slot.
    ///
    /// `kind` is the storage holding the record: for a relation pair, its
    /// source kind. Returns `None` once the slot has been reused.
    pub fn record_at<C: Component>(&self, kind: ComponentId, loc: RecordLoc) -> Option<&C> {
        self.components.at(kind, loc)
    }

    // ── Entities ───────────────────────────────────────────────────

    /// Create an entity, reusing the oldest freed identity if one exists.
    pub fn add_entity(&mut self) -> EntityId {
        self.entities.create()
    }

    /// Whether `entity` is alive.
    pub fn has_entity(&self, entity: EntityId) -> bool {
        self.entities.contains(entity)
    }

    /// Number of live entities, hidden relation entities included.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entities.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter()
    }

    /// Remove `entity` and everything attached to it.
    ///
    /// Relations whose source is `entity` are dropped and their relation
    /// entities torn down. Relations pointing *at* `entity` are left alone.
    /// A source holding relations is pinned permanent, so this only happens
    /// after the pin was lifted with [`World::set_permanent`].
    ///
    /// # Panics
    ///
    /// Panics if `entity` is not alive or is permanent.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.expect_alive(entity);
        if self.flags(entity).is_permanent() {
            Violation::PermanentEntity { entity }.raise();
        }
        for (target, relation) in self.relations.remove_source(entity) {
            self.destroy_relation_entity(entity, target, relation);
        }
        self.components.remove_entity(entity);
        self.entities.remove(entity);
    }

    // ── Components ─────────────────────────────────────────────────

    /// Identity of component type `C`, registering it on first use.
    pub fn component_id<C: Component>(&mut self) -> ComponentId {
        let kind = self.registry.component::<C>();
        self.components.ensure::<C>(self.registry.info(kind));
        kind
    }

    /// Attach or overwrite `entity`'s `C`.
    pub fn set_component<C: Component>(&mut self, entity: EntityId, value: C) {
        self.expect_mutable(entity);
        let kind = self.component_id::<C>();
        self.components.set(kind, entity, value);
        self.mark_changed(entity);
    }

    /// `entity`'s `C`, if present.
    pub fn get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.expect_alive(entity);
        let kind = self.registry.lookup::<C>()?;
        self.components.get(kind, entity)
    }

    /// `entity`'s `C`, mutably. Marks the entity changed when present.
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        self.expect_mutable(entity);
        let kind = self.registry.lookup::<C>()?;
        if !self.components.has(kind, entity) {
            return None;
        }
        self.mark_changed(entity);
        self.components.get_mut(kind, entity)
    }

    /// Whether `entity` has a `C`.
    pub fn has_component<C: Component>(&self, entity: EntityId) -> bool {
        self.expect_alive(entity);
        self.registry
            .lookup::<C>()
            .is_some_and(|kind| self.components.has(kind, entity))
    }

    /// Detach and return `entity`'s `C`.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        self.expect_mutable(entity);
        let kind = self.registry.lookup::<C>()?;
        let value = self.components.take(kind, entity)?;
        self.mark_changed(entity);
        Some(value)
    }

    /// Kinds present on `entity` in identity order, entity flags excluded.
    pub fn components_of(&self, entity: EntityId) -> impl Iterator<Item = ComponentId> + '_ {
        self.expect_alive(entity);
        let flags = self.flags_kind;
        self.components.kinds_of(entity).filter(move |&k| k != flags)
    }

    /// FNV-1a checksum over [`World::components_of`].
    pub fn component_checksum(&self, entity: EntityId) -> Checksum {
        self.components_of(entity).collect()
    }

    // ── Tags ───────────────────────────────────────────────────────

    /// Identity of tag type `T`, registering it on first use.
    pub fn tag_id<T: 'static>(&mut self) -> ComponentId {
        let kind = self.registry.tag::<T>();
        self.components.ensure::<()>(self.registry.info(kind));
        kind
    }

    /// Relation target naming tag type `T`.
    pub fn tag_target<T: 'static>(&mut self) -> RelationTarget {
        RelationTarget::Tag(self.tag_id::<T>())
    }

    /// Attach tag `T` to `entity`.
    pub fn add_tag<T: 'static>(&mut self, entity: EntityId) {
        self.expect_mutable(entity);
        let kind = self.tag_id::<T>();
        self.components.set(kind, entity, ());
        self.mark_changed(entity);
    }

    /// Whether `entity` carries tag `T`.
    pub fn has_tag<T: 'static>(&self, entity: EntityId) -> bool {
        self.expect_alive(entity);
        self.registry
            .lookup::<T>()
            .is_some_and(|kind| self.components.has(kind, entity))
    }

    /// Detach tag `T`. Returns whether it was present.
    pub fn remove_tag<T: 'static>(&mut self, entity: EntityId) -> bool {
        self.expect_mutable(entity);
        let Some(kind) = self.registry.lookup::<T>() else {
            return false;
        };
        let removed = self.components.remove(kind, entity);
        if removed {
            self.mark_changed(entity);
        }
        removed
    }

    // ── Relations ──────────────────────────────────────────────────

    /// Attach `value` as `entity`'s `C` relation towards `target`.
    ///
    /// The value is stored on the hidden relation entity for
    /// `(entity, target)`, created on first use. Each relation kind on the
    /// pair holds one reference to that entity. The first relation entity
    /// of a source pins it permanent.
    pub fn set_component_relation<C: Component>(
        &mut self,
        entity: EntityId,
        value: C,
        target: impl Into<RelationTarget>,
    ) {
        self.expect_mutable(entity);
        let target = target.into();
        let kind = self.component_id::<C>();
        let pair = self.registry.pair(kind, target);
        self.components.ensure::<C>(self.registry.info(pair));
        let relation = match self.relations.get(entity, target) {
            Some(relation) => relation,
            None => self.spawn_relation_entity(entity, target),
        };
        if !self.components.has(pair, entity) {
            self.relations.retain(entity, target, relation);
            self.components.set_ref::<C>(pair, entity, relation);
        }
        self.components.set(kind, relation, value);
        self.mark_changed(entity);
    }

    /// `entity`'s `C` relation towards `target`.
    pub fn get_component_relation<C: Component>(
        &self,
        entity: EntityId,
        target: impl Into<RelationTarget>,
    ) -> Option<&C> {
        self.expect_alive(entity);
        let kind = self.registry.lookup::<C>()?;
        let pair = self.registry.lookup_pair(kind, target.into())?;
        let (source, holder) = self.components.resolve(pair, entity)?;
        self.components.get(source, holder)
    }

    /// `entity`'s `C` relation towards `target`, mutably.
    pub fn get_component_relation_mut<C: Component>(
        &mut self,
        entity: EntityId,
        target: impl Into<RelationTarget>,
    ) -> Option<&mut C> {
        self.expect_mutable(entity);
        let kind = self.registry.lookup::<C>()?;
        let pair = self.registry.lookup_pair(kind, target.into())?;
        let (source, holder) = self.components.resolve(pair, entity)?;
        self.mark_changed(entity);
        self.components.get_mut(source, holder)
    }

    /// Whether `entity` has a `C` relation towards `target`.
    pub fn has_component_relation<C: Component>(
        &self,
        entity: EntityId,
        target: impl Into<RelationTarget>,
    ) -> bool {
        self.get_component_relation::<C>(entity, target).is_some()
    }

    /// Drop `entity`'s `C` relation towards `target`, returning its value.
    ///
    /// Removing the pair's last relation kind tears its relation entity
    /// down; tearing down the source's last one lifts its pin.
    pub fn remove_component_relation<C: Component>(
        &mut self,
        entity: EntityId,
        target: impl Into<RelationTarget>,
    ) -> Option<C> {
        self.expect_mutable(entity);
        let target = target.into();
        let kind = self.registry.lookup::<C>()?;
        let pair = self.registry.lookup_pair(kind, target)?;
        let (_, holder) = self.components.resolve(pair, entity)?;
        self.components.remove(pair, entity);
        let value = self.components.take::<C>(kind, holder);
        if let Some(relation) = self.relations.release(entity, target) {
            self.destroy_relation_entity(entity, target, relation);
        }
        self.mark_changed(entity);
        value
    }

    /// Attach tag relation `T` from `entity` towards `target`.
    ///
    /// Tag relations carry no payload and need no relation entity.
    pub fn set_tag_relation<T: 'static>(&mut self, entity: EntityId, target: impl Into<RelationTarget>) {
        self.expect_mutable(entity);
        let tag = self.tag_id::<T>();
        let pair = self.registry.pair(tag, target.into());
        self.components.ensure::<()>(self.registry.info(pair));
        self.components.set(pair, entity, ());
        self.mark_changed(entity);
    }

    /// Whether `entity` has tag relation `T` towards `target`.
    pub fn has_tag_relation<T: 'static>(&self, entity: EntityId, target: impl Into<RelationTarget>) -> bool {
        self.expect_alive(entity);
        self.registry
            .lookup::<T>()
            .and_then(|tag| self.registry.lookup_pair(tag, target.into()))
            .is_some_and(|pair| self.components.has(pair, entity))
    }

    /// Drop tag relation `T` from `entity` towards `target`.
    pub fn remove_tag_relation<T: 'static>(&mut self, entity: EntityId, target: impl Into<RelationTarget>) -> bool {
        self.expect_mutable(entity);
        let pair = self
            .registry
            .lookup::<T>()
            .and_then(|tag| self.registry.lookup_pair(tag, target.into()));
        let removed = pair.is_some_and(|pair| self.components.remove(pair, entity));
        if removed {
            self.mark_changed(entity);
        }
        removed
    }

    /// Identity of the `(kind, target)` pair kind, registering it on first use.
    pub fn pair_id<C: Component>(&mut self, target: impl Into<RelationTarget>) -> ComponentId {
        let kind = self.component_id::<C>();
        let pair = self.registry.pair(kind, target.into());
        self.components.ensure::<C>(self.registry.info(pair));
        pair
    }

    /// The hidden entity holding `entity`'s relation values towards `target`.
    pub fn relation_entity(&self, entity: EntityId, target: impl Into<RelationTarget>) -> Option<EntityId> {
        self.relations.get(entity, target.into())
    }

    /// Number of relation kinds sharing `entity`'s relation entity towards
    /// `target`.
    pub fn relation_count(&self, entity: EntityId, target: impl Into<RelationTarget>) -> u32 {
        self.relations.count(entity, target.into())
    }

    /// Live `(target, relation entity)` pairs whose source is `entity`.
    pub fn relations_of(&self, entity: EntityId) -> Vec<(RelationTarget, EntityId)> {
        self.relations.targets(entity)
    }

    fn spawn_relation_entity(&mut self, source: EntityId, target: RelationTarget) -> EntityId {
        if !self.relations.has_relations(source) && !self.flags(source).is_permanent() {
            self.update_flags(source, EntityFlags::PERMANENT, true);
            self.relations.pin(source);
        }
        let relation = self.entities.create();
        self.write_flags(relation, EntityFlags::PERMANENT | EntityFlags::RELATION);
        tracing::debug!(%source, %target, %relation, "relation entity created");
        relation
    }

    fn destroy_relation_entity(&mut self, source: EntityId, target: RelationTarget, relation: EntityId) {
        let flags = self.flags(relation) - EntityFlags::PERMANENT;
        self.write_flags(relation, flags);
        self.remove_entity(relation);
        tracing::debug!(%source, %target, %relation, "relation entity torn down");
        if !self.relations.has_relations(source) && self.relations.unpin(source) {
            self.update_flags(source, EntityFlags::PERMANENT, false);
            tracing::debug!(%source, "relation pin lifted");
        }
    }

    // ── Resources ──────────────────────────────────────────────────

    /// Identity of resource type `R`, registering it on first use.
    pub fn resource_id<R: Component>(&mut self) -> ResourceId {
        self.registry.resource::<R>()
    }

    /// Store `value` as the world's `R`, replacing any previous one.
    pub fn add_resource<R: Component>(&mut self, value: R) {
        let id = self.registry.resource::<R>();
        self.resources.insert(id, value);
    }

    /// The world's `R`.
    pub fn get_resource<R: Component>(&self) -> Option<&R> {
        self.resources.get(self.registry.lookup_resource::<R>()?)
    }

    /// The world's `R`, mutably.
    pub fn get_resource_mut<R: Component>(&mut self) -> Option<&mut R> {
        let id = self.registry.lookup_resource::<R>()?;
        self.resources.get_mut(id)
    }

    /// Whether the world holds an `R`.
    pub fn has_resource<R: Component>(&self) -> bool {
        self.registry
            .lookup_resource::<R>()
            .is_some_and(|id| self.resources.contains(id))
    }

    /// Remove and return the world's `R`.
    pub fn remove_resource<R: Component>(&mut self) -> Option<R> {
        let id = self.registry.lookup_resource::<R>()?;
        self.resources.remove(id)
    }

    // ── Flags and prefabs ──────────────────────────────────────────

    /// `entity`'s flags. An entity with no flags record has none set.
    pub fn flags(&self, entity: EntityId) -> EntityFlags {
        self.expect_alive(entity);
        self.components
            .get::<EntityFlags>(self.flags_kind, entity)
            .copied()
            .unwrap_or_default()
    }

    /// Forbid (or allow again) changes to `entity`'s components and tags.
    pub fn set_immutable(&mut self, entity: EntityId, immutable: bool) {
        self.update_flags(entity, EntityFlags::IMMUTABLE, immutable);
    }

    /// Forbid (or allow again) removal of `entity`.
    ///
    /// Takes over a pin held by `entity`'s relations: the flag then stays
    /// as set here when its last relation goes away.
    pub fn set_permanent(&mut self, entity: EntityId, permanent: bool) {
        self.expect_alive(entity);
        self.relations.unpin(entity);
        self.update_flags(entity, EntityFlags::PERMANENT, permanent);
    }

    /// Designate `entity` as a prefab. Prefabs are permanent and are
    /// skipped by queries.
    pub fn set_prefab(&mut self, entity: EntityId) {
        self.expect_alive(entity);
        self.relations.unpin(entity);
        self.update_flags(entity, EntityFlags::PREFAB | EntityFlags::PERMANENT, true);
    }

    /// Clear `entity`'s change flag.
    pub fn clear_changed(&mut self, entity: EntityId) {
        self.update_flags(entity, EntityFlags::CHANGED, false);
    }

    /// Create an entity carrying copies of `prefab`'s components and tags.
    ///
    /// Flags are not copied. Neither are component relations, whose values
    /// belong to the prefab's own relation entities; tag relations are.
    pub fn add_entity_from_prefab(&mut self, prefab: EntityId) -> EntityId {
        self.expect_alive(prefab);
        let entity = self.entities.create();
        let flags = self.flags_kind;
        let copied = self.components.copy_entity(prefab, entity, |info| {
            info.id != flags && !matches!(info.class, StorageClass::Indirect { .. })
        });
        if copied > 0 {
            self.mark_changed(entity);
        }
        entity
    }

    fn update_flags(&mut self, entity: EntityId, bits: EntityFlags, on: bool) {
        let mut flags = self.flags(entity);
        flags.set(bits, on);
        self.write_flags(entity, flags);
    }

    fn mark_changed(&mut self, entity: EntityId) {
        let flags = self.flags(entity);
        if !flags.contains(EntityFlags::CHANGED) {
            self.write_flags(entity, flags | EntityFlags::CHANGED);
        }
    }

    /// Store `flags`, dropping the record entirely when none are set.
    fn write_flags(&mut self, entity: EntityId, flags: EntityFlags) {
        if flags.is_empty() {
            self.components.take::<EntityFlags>(self.flags_kind, entity);
        } else {
            self.components.set(self.flags_kind, entity, flags);
        }
    }

    // ── Invariant checks ───────────────────────────────────────────

    #[track_caller]
    fn expect_alive(&self, entity: EntityId) {
        if !self.entities.contains(entity) {
            Violation::UnknownEntity { entity }.raise();
        }
    }

    #[track_caller]
    fn expect_mutable(&self, entity: EntityId) {
        if self.flags(entity).is_immutable() {
            Violation::ImmutableEntity { entity }.raise();
        }
    }
}
