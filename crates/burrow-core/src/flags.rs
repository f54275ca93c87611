//! Per-entity lifecycle and change-notification flags.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

bitflags! {
    /// Flags attached to an entity.
    ///
    /// Stored as an ordinary dense component; an entity without the flags
    /// component behaves as if every flag were clear.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
    #[repr(transparent)]
    pub struct EntityFlags: u32 {
        /// The entity is a template that new entities are copied from.
        const PREFAB = 1 << 0;
        /// Components and tags may not be set or removed.
        const IMMUTABLE = 1 << 1;
        /// The entity may not be removed.
        const PERMANENT = 1 << 2;
        /// Hidden entity backing a relation pair.
        const RELATION = 1 << 3;
        /// A component or tag was added, overwritten, or removed since the
        /// flag was last cleared.
        const CHANGED = 1 << 4;
    }
}

impl EntityFlags {
    /// Whether the entity is a prefab.
    pub fn is_prefab(self) -> bool {
        self.contains(Self::PREFAB)
    }

    /// Whether mutation of the entity's components is forbidden.
    pub fn is_immutable(self) -> bool {
        self.contains(Self::IMMUTABLE)
    }

    /// Whether removal of the entity is forbidden.
    pub fn is_permanent(self) -> bool {
        self.contains(Self::PERMANENT)
    }

    /// Whether the entity is a hidden relation entity.
    pub fn is_relation(self) -> bool {
        self.contains(Self::RELATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_clear() {
        let f = EntityFlags::default();
        assert!(!f.is_prefab());
        assert!(!f.is_immutable());
        assert!(!f.is_permanent());
        assert!(!f.is_relation());
    }

    #[test]
    fn flags_are_plain_data() {
        let f = EntityFlags::PREFAB | EntityFlags::PERMANENT;
        let raw: u32 = bytemuck::cast(f);
        assert_eq!(raw, 0b101);
    }
}
