//! Per-world assignment of component, tag, pair, and resource identities.

use std::any::{type_name, TypeId};

use indexmap::IndexMap;

use burrow_core::{Component, ComponentId, RelationTarget, ResourceId, Violation};

/// How a component kind is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    /// One record per entity.
    Dense,
    /// Presence only; no payload.
    Unit,
    /// A reference to a record held in another kind's storage.
    Indirect {
        /// Kind whose storage holds the records.
        source: ComponentId,
    },
}

impl StorageClass {
    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Unit => "unit",
            Self::Indirect { .. } => "indirect",
        }
    }
}

/// Metadata fixed when a kind is first registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Identity of the kind.
    pub id: ComponentId,
    /// Type name, for diagnostics.
    pub name: &'static str,
    /// Record size in bytes (0 for unit kinds).
    pub size: usize,
    /// Storage variant.
    pub class: StorageClass,
}

/// Metadata for a resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Identity of the resource kind.
    pub id: ResourceId,
    /// Type name, for diagnostics.
    pub name: &'static str,
    /// Record size in bytes.
    pub size: usize,
}

/// Assigns identities on first use.
///
/// Identities are dense and sequential per world; two worlds may assign
/// different identities to the same Rust type.
#[derive(Debug, Default)]
pub struct Registry {
    by_type: IndexMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
    pairs: IndexMap<(ComponentId, RelationTarget), ComponentId>,
    resources: IndexMap<TypeId, ResourceId>,
    resource_infos: Vec<ResourceInfo>,
}

impl Registry {
    /// Create an empty registry sized for the given number of kinds.
    pub fn with_capacity(components: usize, resources: usize) -> Self {
        Self {
            by_type: IndexMap::with_capacity(components),
            infos: Vec::with_capacity(components),
            pairs: IndexMap::new(),
            resources: IndexMap::with_capacity(resources),
            resource_infos: Vec::with_capacity(resources),
        }
    }

    /// Identity of component type `C`, registering it as dense on first use.
    ///
    /// Kinds are keyed by `TypeId`, so the recorded size always matches
    /// `C`. Reading a storage through the wrong record type is caught
    /// where the storage is downcast.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::WrongStorage`] if `C` was registered as a tag.
    pub fn component<C: Component>(&mut self) -> ComponentId {
        let id = self.register_type::<C>(std::mem::size_of::<C>(), StorageClass::Dense);
        let info = self.infos[id.0 as usize];
        if info.class != StorageClass::Dense {
            Violation::WrongStorage {
                kind: id,
                expected: StorageClass::Dense.name(),
            }
            .raise();
        }
        id
    }

    /// Identity of tag type `T`, registering it as a unit kind on first use.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::WrongStorage`] if `T` was registered as a
    /// dense component.
    pub fn tag<T: 'static>(&mut self) -> ComponentId {
        let id = self.register_type::<T>(0, StorageClass::Unit);
        if self.infos[id.0 as usize].class != StorageClass::Unit {
            Violation::WrongStorage {
                kind: id,
                expected: StorageClass::Unit.name(),
            }
            .raise();
        }
        id
    }

    /// Identity of type `T` if it has been registered.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Identity of the pair kind `(kind, target)`, registering it on first use.
    ///
    /// A dense `kind` yields an indirect pair whose records live in `kind`'s
    /// storage. A unit `kind` yields a unit pair.
    pub fn pair(&mut self, kind: ComponentId, target: RelationTarget) -> ComponentId {
        if let Some(&id) = self.pairs.get(&(kind, target)) {
            return id;
        }
        let base = self.info(kind);
        let class = match base.class {
            StorageClass::Unit => StorageClass::Unit,
            _ => StorageClass::Indirect { source: kind },
        };
        let id = self.push(base.name, base.size, class);
        self.pairs.insert((kind, target), id);
        id
    }

    /// Identity of the pair kind `(kind, target)` if registered.
    pub fn lookup_pair(&self, kind: ComponentId, target: RelationTarget) -> Option<ComponentId> {
        self.pairs.get(&(kind, target)).copied()
    }

    /// Identity of resource type `R`, registering it on first use.
    pub fn resource<R: Component>(&mut self) -> ResourceId {
        let next = ResourceId(self.resource_infos.len() as u32);
        let id = *self.resources.entry(TypeId::of::<R>()).or_insert(next);
        if id == next {
            self.resource_infos.push(ResourceInfo {
                id,
                name: type_name::<R>(),
                size: std::mem::size_of::<R>(),
            });
        }
        id
    }

    /// Identity of resource type `R` if registered.
    pub fn lookup_resource<R: 'static>(&self) -> Option<ResourceId> {
        self.resources.get(&TypeId::of::<R>()).copied()
    }

    /// Metadata for `kind`.
    ///
    /// # Panics
    ///
    /// Panics with [`Violation::UnknownComponent`] if `kind` was never
    /// registered in this world.
    pub fn info(&self, kind: ComponentId) -> ComponentInfo {
        match self.infos.get(kind.0 as usize) {
            Some(info) => *info,
            None => Violation::UnknownComponent { kind }.raise(),
        }
    }

    /// Metadata for a resource kind.
    pub fn resource_info(&self, id: ResourceId) -> Option<&ResourceInfo> {
        self.resource_infos.get(id.0 as usize)
    }

    /// Number of registered component kinds.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no component kind is registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// All registered component kinds, in identity order.
    pub fn infos(&self) -> &[ComponentInfo] {
        &self.infos
    }

    fn register_type<T: 'static>(&mut self, size: usize, class: StorageClass) -> ComponentId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return id;
        }
        let id = self.push(type_name::<T>(), size, class);
        self.by_type.insert(TypeId::of::<T>(), id);
        id
    }

    fn push(&mut self, name: &'static str, size: usize, class: StorageClass) -> ComponentId {
        let id = ComponentId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name,
            size,
            class,
        });
        id
    }
}
