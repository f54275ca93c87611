//! Per-kind component storage.
//!
//! Every kind gets exactly one [`Storage`], created lazily on first use.
//! The payload layout depends on the kind's [`StorageClass`]; presence is
//! always tracked by a [`HiBitSet`] indexed by entity identity so that
//! queries can intersect storages without touching records.

use std::any::Any;
use std::fmt;

use bytemuck::{Pod, Zeroable};

use burrow_arena::Arena;
use burrow_core::{Component, ComponentId, EntityId, Violation};
use burrow_index::{DisplacedSet, HiBitSet, SparseSet};

use crate::registry::{ComponentInfo, StorageClass};

const NO_REF: u32 = u32::MAX;

/// Where a record sits inside a dense storage.
///
/// `slot` indexes the storage's dense array directly; `holder` is the
/// entity the record is keyed by and guards against reading a slot that a
/// later removal has reused. A location stays valid until the storage
/// next changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RecordLoc {
    /// Entity the record is keyed by. For relation pairs this is the
    /// hidden relation entity, not the source.
    pub holder: EntityId,
    /// Position in the dense array.
    pub slot: u32,
}

impl RecordLoc {
    /// Sentinel slot for rows whose record could not be located.
    pub const NO_SLOT: u32 = u32::MAX;
}

/// Payload layout of a [`Storage`].
pub enum StorageKind<C> {
    /// Records packed densely, addressed by entity.
    Dense(SparseSet<C>),
    /// Presence only.
    Unit,
    /// Per-entity reference to the entity whose record in `source`'s
    /// storage holds the value.
    Indirect {
        /// Kind whose storage holds the records.
        source: ComponentId,
        /// Entity to record-holder map.
        refs: DisplacedSet<u32>,
    },
}

/// Storage for one component kind.
pub struct Storage<C> {
    info: ComponentInfo,
    presence: HiBitSet,
    kind: StorageKind<C>,
}

impl<C: Component> Storage<C> {
    /// Create the storage matching `info.class`.
    pub fn new(info: ComponentInfo) -> Self {
        let kind = match info.class {
            StorageClass::Dense => StorageKind::Dense(SparseSet::new()),
            StorageClass::Unit => StorageKind::Unit,
            StorageClass::Indirect { source } => StorageKind::Indirect {
                source,
                refs: DisplacedSet::new(NO_REF),
            },
        };
        Self {
            info,
            presence: HiBitSet::new(),
            kind,
        }
    }

    /// The payload layout.
    pub fn kind(&self) -> &StorageKind<C> {
        &self.kind
    }

    /// The record for `entity`. Always `None` for unit and indirect storages.
    pub fn get<'a>(&self, arena: &'a Arena, entity: EntityId) -> Option<&'a C> {
        match &self.kind {
            StorageKind::Dense(records) => records.get(arena, entity.0),
            _ => None,
        }
    }

    /// The record for `entity`, mutably.
    pub fn get_mut<'a>(&self, arena: &'a mut Arena, entity: EntityId) -> Option<&'a mut C> {
        match &self.kind {
            StorageKind::Dense(records) => records.get_mut(arena, entity.0),
            _ => None,
        }
    }

    /// Dense slot of `entity`'s record. Always `None` for unit and indirect
    /// storages.
    pub fn slot(&self, arena: &Arena, entity: EntityId) -> Option<u32> {
        match &self.kind {
            StorageKind::Dense(records) => records.dense_index(arena, entity.0).map(|i| i as u32),
            _ => None,
        }
    }

    /// The record at `loc`, without going through the sparse index.
    ///
    /// Returns `None` when the slot no longer holds `loc.holder`'s record.
    pub fn at<'a>(&self, arena: &'a Arena, loc: RecordLoc) -> Option<&'a C> {
        let StorageKind::Dense(records) = &self.kind else {
            return None;
        };
        let slot = loc.slot as usize;
        if slot >= records.len() || records.key_at(arena, slot) != loc.holder.0 {
            return None;
        }
        records.as_slice(arena).get(slot)
    }

    /// Store `value` for `entity` and mark it present.
    ///
    /// Returns whether a payload was stored: `false` for unit storages,
    /// which only record presence.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::WrongStorage`] on an indirect storage.
    pub fn set(&mut self, arena: &mut Arena, entity: EntityId, value: C) -> bool {
        let stored = match &mut self.kind {
            StorageKind::Dense(records) => {
                records.set(arena, entity.0, value);
                true
            }
            StorageKind::Unit => false,
            StorageKind::Indirect { .. } => Violation::WrongStorage {
                kind: self.info.id,
                expected: StorageClass::Dense.name(),
            }
            .raise(),
        };
        self.presence.set(entity.0);
        stored
    }

    /// Remove `entity`'s record, returning it if the storage is dense.
    pub fn take(&mut self, arena: &mut Arena, entity: EntityId) -> Option<C> {
        if !self.presence.unset(entity.0) {
            return None;
        }
        match &mut self.kind {
            StorageKind::Dense(records) => records.remove(arena, entity.0),
            StorageKind::Unit => None,
            StorageKind::Indirect { refs, .. } => {
                refs.remove(arena, entity.0);
                None
            }
        }
    }

    /// Point `entity` at `holder`'s record in the source storage.
    pub fn set_ref(&mut self, arena: &mut Arena, entity: EntityId, holder: EntityId) {
        match &mut self.kind {
            StorageKind::Indirect { refs, .. } => refs.set(arena, entity.0, holder.0),
            _ => Violation::WrongStorage {
                kind: self.info.id,
                expected: "indirect",
            }
            .raise(),
        }
        self.presence.set(entity.0);
    }
}

/// Type-erased view of a [`Storage`], one per registered kind.
pub trait ComponentColumn: Any {
    /// Metadata of the stored kind.
    fn info(&self) -> &ComponentInfo;

    /// Whether `entity` has this kind.
    fn has(&self, entity: EntityId) -> bool;

    /// Entities that have this kind.
    fn presence(&self) -> &HiBitSet;

    /// Drop `entity`'s entry and clear its presence bit.
    ///
    /// Returns whether a record or reference was dropped. Unit storages
    /// hold neither and always return `false`.
    fn remove(&mut self, arena: &mut Arena, entity: EntityId) -> bool;

    /// Copy `from`'s entry onto `to`. Returns whether anything was copied.
    fn copy_to(&mut self, arena: &mut Arena, from: EntityId, to: EntityId) -> bool;

    /// Where `entity`'s value lives: the kind whose storage holds the record
    /// and the entity that record is keyed by. Indirect storages resolve to
    /// their source kind.
    fn resolve(&self, arena: &Arena, entity: EntityId) -> Option<(ComponentId, EntityId)>;

    /// Dense slot of `entity`'s record, for dense storages.
    fn slot(&self, arena: &Arena, entity: EntityId) -> Option<u32>;

    /// Payload entries held: records for dense storages, references for
    /// indirect ones, none for unit storages.
    fn entry_count(&self) -> usize;

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ComponentColumn for Storage<C> {
    fn info(&self) -> &ComponentInfo {
        &self.info
    }

    fn has(&self, entity: EntityId) -> bool {
        self.presence.is_set(entity.0)
    }

    fn presence(&self) -> &HiBitSet {
        &self.presence
    }

    fn remove(&mut self, arena: &mut Arena, entity: EntityId) -> bool {
        let present = self.has(entity);
        self.take(arena, entity);
        present && !matches!(self.kind, StorageKind::Unit)
    }

    fn copy_to(&mut self, arena: &mut Arena, from: EntityId, to: EntityId) -> bool {
        if !self.has(from) {
            return false;
        }
        match &mut self.kind {
            StorageKind::Dense(records) => {
                let Some(&value) = records.get(arena, from.0) else {
                    return false;
                };
                records.set(arena, to.0, value);
            }
            StorageKind::Unit => {}
            StorageKind::Indirect { refs, .. } => {
                let Some(&holder) = refs.get(arena, from.0) else {
                    return false;
                };
                refs.set(arena, to.0, holder);
            }
        }
        self.presence.set(to.0);
        true
    }

    fn resolve(&self, arena: &Arena, entity: EntityId) -> Option<(ComponentId, EntityId)> {
        if !self.has(entity) {
            return None;
        }
        match &self.kind {
            StorageKind::Indirect { source, refs } => {
                refs.get(arena, entity.0).map(|&h| (*source, EntityId(h)))
            }
            _ => Some((self.info.id, entity)),
        }
    }

    fn slot(&self, arena: &Arena, entity: EntityId) -> Option<u32> {
        Storage::slot(self, arena, entity)
    }

    fn entry_count(&self) -> usize {
        match &self.kind {
            StorageKind::Dense(records) => records.len(),
            StorageKind::Unit => 0,
            StorageKind::Indirect { .. } => self.presence.count_ones(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<C> fmt::Debug for Storage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("info", &self.info)
            .field("present", &self.presence.count_ones())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(class: StorageClass) -> ComponentInfo {
        ComponentInfo {
            id: ComponentId(0),
            name: "test",
            size: 8,
            class,
        }
    }

    #[test]
    fn dense_set_get_remove() {
        let mut arena = Arena::default();
        let mut s = Storage::<u64>::new(info(StorageClass::Dense));
        assert!(s.set(&mut arena, EntityId(3), 0));
        assert_eq!(s.get(&arena, EntityId(3)), Some(&0), "zero is a valid record");
        assert!(s.has(EntityId(3)));
        assert_eq!(s.take(&mut arena, EntityId(3)), Some(0));
        assert!(!s.has(EntityId(3)));
        assert!(!s.remove(&mut arena, EntityId(3)));
    }

    #[test]
    fn unit_tracks_presence_only() {
        let mut arena = Arena::default();
        let mut s = Storage::<()>::new(info(StorageClass::Unit));
        assert!(!s.set(&mut arena, EntityId(1), ()));
        assert!(s.has(EntityId(1)));
        assert_eq!(s.get(&arena, EntityId(1)), None);
        assert_eq!(s.entry_count(), 0);
        assert!(!s.remove(&mut arena, EntityId(1)), "unit remove drops no payload");
        assert!(!s.has(EntityId(1)));
        assert!(s.presence().is_empty());
    }

    #[test]
    fn record_locations_track_swap_removal() {
        let mut arena = Arena::default();
        let mut s = Storage::<u64>::new(info(StorageClass::Dense));
        for e in 0..3 {
            s.set(&mut arena, EntityId(e), u64::from(e) * 10);
        }
        let slot = s.slot(&arena, EntityId(2)).unwrap();
        let loc = RecordLoc { holder: EntityId(2), slot };
        assert_eq!(s.at(&arena, loc), Some(&20));
        assert_eq!(s.entry_count(), 3);

        s.take(&mut arena, EntityId(0));
        assert_eq!(s.at(&arena, loc), None, "slot was vacated by the move");
        let moved = RecordLoc {
            holder: EntityId(2),
            slot: s.slot(&arena, EntityId(2)).unwrap(),
        };
        assert_eq!(s.at(&arena, moved), Some(&20));
        assert_eq!(s.entry_count(), 2);
    }

    #[test]
    fn indirect_resolves_to_holder() {
        let mut arena = Arena::default();
        let mut s = Storage::<u64>::new(info(StorageClass::Indirect {
            source: ComponentId(7),
        }));
        s.set_ref(&mut arena, EntityId(2), EntityId(40));
        assert_eq!(
            s.resolve(&arena, EntityId(2)),
            Some((ComponentId(7), EntityId(40)))
        );
        assert_eq!(s.get(&arena, EntityId(2)), None);
        assert!(s.copy_to(&mut arena, EntityId(2), EntityId(5)));
        assert_eq!(
            s.resolve(&arena, EntityId(5)),
            Some((ComponentId(7), EntityId(40)))
        );
    }

    #[test]
    fn copy_to_duplicates_record() {
        let mut arena = Arena::default();
        let mut s = Storage::<u64>::new(info(StorageClass::Dense));
        s.set(&mut arena, EntityId(0), 11);
        assert!(s.copy_to(&mut arena, EntityId(0), EntityId(9)));
        assert_eq!(s.get(&arena, EntityId(9)), Some(&11));
        assert!(!s.copy_to(&mut arena, EntityId(4), EntityId(5)));
    }

    #[test]
    #[should_panic(expected = "not backed by dense storage")]
    fn set_on_indirect_panics() {
        let mut arena = Arena::default();
        let mut s = Storage::<u64>::new(info(StorageClass::Indirect {
            source: ComponentId(1),
        }));
        s.set(&mut arena, EntityId(0), 1);
    }

    #[test]
    fn erased_downcast_round_trips() {
        let column: Box<dyn ComponentColumn> = Box::new(Storage::<u32>::new(info(StorageClass::Dense)));
        assert!(column.as_any().downcast_ref::<Storage<u32>>().is_some());
        assert!(column.as_any().downcast_ref::<Storage<u64>>().is_none());
    }
}
