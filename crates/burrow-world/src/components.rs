//! The set of component storages owned by a world.

use burrow_arena::{Arena, ArenaConfig};
use burrow_core::{Component, ComponentId, EntityId, Violation};

use crate::registry::ComponentInfo;
use crate::storage::{ComponentColumn, RecordLoc, Storage};

/// One lazily created storage per component kind, all sharing one arena.
pub struct WorldComponents {
    arena: Arena,
    columns: Vec<Option<Box<dyn ComponentColumn>>>,
}

impl WorldComponents {
    /// Create an empty set with room for `capacity` kinds.
    pub fn new(config: ArenaConfig, capacity: usize) -> Self {
        Self {
            arena: Arena::new(config),
            columns: Vec::with_capacity(capacity),
        }
    }

    /// The arena holding every record.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The erased storage for `kind`, if created.
    pub fn column(&self, kind: ComponentId) -> Option<&dyn ComponentColumn> {
        self.columns.get(kind.0 as usize)?.as_deref()
    }

    /// Erased storages that exist, in kind order.
    pub fn columns(&self) -> impl Iterator<Item = &dyn ComponentColumn> + '_ {
        self.columns.iter().filter_map(|c| c.as_deref())
    }

    /// Create the storage for `info` if it does not exist yet.
    pub fn ensure<C: Component>(&mut self, info: ComponentInfo) {
        let index = info.id.0 as usize;
        if self.columns.len() <= index {
            self.columns.resize_with(index + 1, || None);
        }
        if self.columns[index].is_none() {
            self.columns[index] = Some(Box::new(Storage::<C>::new(info)));
        }
    }

    /// Typed storage for `kind`.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::SizeMismatch`] if the storage was created for
    /// a different record type.
    pub fn storage<C: Component>(&self, kind: ComponentId) -> Option<&Storage<C>> {
        let column = self.column(kind)?;
        match column.as_any().downcast_ref::<Storage<C>>() {
            Some(storage) => Some(storage),
            None => mismatch::<C>(column.info()),
        }
    }

    /// Typed storage for `kind` together with the arena, both mutable.
    pub fn storage_mut<C: Component>(&mut self, kind: ComponentId) -> Option<(&mut Storage<C>, &mut Arena)> {
        let column = self.columns.get_mut(kind.0 as usize)?.as_deref_mut()?;
        let info = *column.info();
        match column.as_any_mut().downcast_mut::<Storage<C>>() {
            Some(storage) => Some((storage, &mut self.arena)),
            None => mismatch::<C>(&info),
        }
    }

    /// Record for `entity` in `kind`'s dense storage.
    pub fn get<C: Component>(&self, kind: ComponentId, entity: EntityId) -> Option<&C> {
        self.storage::<C>(kind)?.get(&self.arena, entity)
    }

    /// Record for `entity` in `kind`'s dense storage, mutably.
    pub fn get_mut<C: Component>(&mut self, kind: ComponentId, entity: EntityId) -> Option<&mut C> {
        let (storage, arena) = self.storage_mut::<C>(kind)?;
        storage.get_mut(arena, entity)
    }

    /// Store `value` for `entity` in `kind`'s storage, which must exist.
    pub fn set<C: Component>(&mut self, kind: ComponentId, entity: EntityId, value: C) {
        match self.storage_mut::<C>(kind) {
            Some((storage, arena)) => {
                storage.set(arena, entity, value);
            }
            None => Violation::UnknownComponent { kind }.raise(),
        }
    }

    /// Point `entity` at `holder` in the indirect storage for `kind`.
    pub fn set_ref<C: Component>(&mut self, kind: ComponentId, entity: EntityId, holder: EntityId) {
        match self.storage_mut::<C>(kind) {
            Some((storage, arena)) => storage.set_ref(arena, entity, holder),
            None => Violation::UnknownComponent { kind }.raise(),
        }
    }

    /// Remove and return `entity`'s record for `kind`.
    pub fn take<C: Component>(&mut self, kind: ComponentId, entity: EntityId) -> Option<C> {
        let (storage, arena) = self.storage_mut::<C>(kind)?;
        storage.take(arena, entity)
    }

    /// Whether `entity` has `kind`.
    pub fn has(&self, kind: ComponentId, entity: EntityId) -> bool {
        self.column(kind).is_some_and(|c| c.has(entity))
    }

    /// Drop `entity` from `kind`'s storage. Returns whether it was present.
    pub fn remove(&mut self, kind: ComponentId, entity: EntityId) -> bool {
        let Some(column) = self.columns.get_mut(kind.0 as usize).and_then(|c| c.as_deref_mut()) else {
            return false;
        };
        let present = column.has(entity);
        column.remove(&mut self.arena, entity);
        present
    }

    /// Dense slot of `entity`'s record in `kind`'s storage.
    pub fn slot(&self, kind: ComponentId, entity: EntityId) -> Option<u32> {
        self.column(kind)?.slot(&self.arena, entity)
    }

    /// Record at `loc` in `kind`'s dense storage.
    pub fn at<C: Component>(&self, kind: ComponentId, loc: RecordLoc) -> Option<&C> {
        self.storage::<C>(kind)?.at(&self.arena, loc)
    }

    /// Where `entity`'s value for `kind` is stored.
    pub fn resolve(&self, kind: ComponentId, entity: EntityId) -> Option<(ComponentId, EntityId)> {
        self.column(kind)?.resolve(&self.arena, entity)
    }

    /// Kinds present on `entity`, in kind order.
    pub fn kinds_of(&self, entity: EntityId) -> impl Iterator<Item = ComponentId> + '_ {
        self.columns()
            .filter(move |c| c.has(entity))
            .map(|c| c.info().id)
    }

    /// Copy the kinds on `from` accepted by `keep` onto `to`, returning how
    /// many were copied.
    pub fn copy_entity(
        &mut self,
        from: EntityId,
        to: EntityId,
        mut keep: impl FnMut(&ComponentInfo) -> bool,
    ) -> usize {
        let Self { arena, columns } = self;
        columns
            .iter_mut()
            .filter_map(|c| c.as_deref_mut())
            .filter(|c| keep(c.info()))
            .map(|c| c.copy_to(arena, from, to))
            .filter(|&copied| copied)
            .count()
    }

    /// Remove `entity` from every storage. Returns how many held it.
    pub fn remove_entity(&mut self, entity: EntityId) -> usize {
        let Self { arena, columns } = self;
        columns
            .iter_mut()
            .filter_map(|c| c.as_deref_mut())
            .filter(|c| c.has(entity))
            .map(|c| c.remove(arena, entity))
            .count()
    }
}

fn mismatch<C>(info: &ComponentInfo) -> ! {
    Violation::SizeMismatch {
        kind: info.id,
        expected: info.size,
        actual: std::mem::size_of::<C>(),
    }
    .raise()
}
