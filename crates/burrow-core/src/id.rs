//! Strongly-typed identities for entities, component kinds, and resources.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Identifies a live (or formerly live) entity within a world.
///
/// Entities carry no payload of their own. Identities are recycled through
/// the world's free queue after the entity is removed, so an `EntityId`
/// held across a removal may later name a different entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The raw integer identity.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a component kind (including tags and relation pair kinds).
///
/// Assigned sequentially by the world's registry on first use.
/// `ComponentId(n)` corresponds to the n-th kind registered in that world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ComponentId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a resource kind (a world-global singleton record).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ResourceId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// The far end of a relation: another entity or a tag kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationTarget {
    /// Relation pointing at an entity.
    Entity(EntityId),
    /// Relation pointing at a tag kind.
    Tag(ComponentId),
}

impl RelationTarget {
    /// Largest raw identity a target can carry. The packed key spends one
    /// bit on the namespace.
    pub const MAX_ID: u32 = u32::MAX >> 1;

    /// Pack the target into a single integer key.
    ///
    /// The low bit distinguishes the two namespaces, so an entity and a tag
    /// with the same raw identity never collide.
    ///
    /// # Panics
    ///
    /// Panics if the raw identity exceeds [`RelationTarget::MAX_ID`].
    pub fn key(self) -> u32 {
        let (raw, namespace) = match self {
            Self::Entity(e) => (e.0, 0),
            Self::Tag(c) => (c.0, 1),
        };
        assert!(
            raw <= Self::MAX_ID,
            "relation {} exceeds the target id ceiling {}",
            self,
            Self::MAX_ID
        );
        (raw << 1) | namespace
    }

    /// Inverse of [`RelationTarget::key`].
    pub fn from_key(key: u32) -> Self {
        if key & 1 == 0 {
            Self::Entity(EntityId(key >> 1))
        } else {
            Self::Tag(ComponentId(key >> 1))
        }
    }
}

impl fmt::Display for RelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(e) => write!(f, "entity {e}"),
            Self::Tag(c) => write!(f, "tag {c}"),
        }
    }
}

impl From<EntityId> for RelationTarget {
    fn from(e: EntityId) -> Self {
        Self::Entity(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_target_key_round_trip() {
        for target in [
            RelationTarget::Entity(EntityId(0)),
            RelationTarget::Entity(EntityId(77)),
            RelationTarget::Tag(ComponentId(0)),
            RelationTarget::Tag(ComponentId(12)),
        ] {
            assert_eq!(RelationTarget::from_key(target.key()), target);
        }
    }

    #[test]
    fn largest_target_keeps_its_namespace() {
        let e = RelationTarget::Entity(EntityId(RelationTarget::MAX_ID));
        let t = RelationTarget::Tag(ComponentId(RelationTarget::MAX_ID));
        assert_eq!(RelationTarget::from_key(e.key()), e);
        assert_eq!(RelationTarget::from_key(t.key()), t);
    }

    #[test]
    #[should_panic(expected = "exceeds the target id ceiling")]
    fn oversized_target_is_rejected() {
        RelationTarget::Entity(EntityId(1 << 31)).key();
    }

    #[test]
    fn entity_and_tag_keys_differ() {
        let e = RelationTarget::Entity(EntityId(3));
        let t = RelationTarget::Tag(ComponentId(3));
        assert_ne!(e.key(), t.key());
    }

    #[test]
    fn ids_are_plain_data() {
        let id = EntityId(9);
        let bytes = bytemuck::bytes_of(&id);
        assert_eq!(bytes, &9u32.to_ne_bytes());
    }
}
