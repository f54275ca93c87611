//! Error types for the Burrow entity store.
//!
//! Two families:
//!
//! - [`Violation`]: a broken programmer invariant. These are never returned;
//!   the store panics with the violation's `Display` text so the diagnostic
//!   names exactly which invariant failed.
//! - [`ConfigError`]: a rejected configuration at construction time.

use std::error::Error;
use std::fmt;

use crate::id::{ComponentId, EntityId};

/// A broken programmer invariant.
///
/// Every variant corresponds to a check the store performs before mutating
/// state. Callers that expect the condition as a normal outcome must test
/// for it first (`has_entity`, `has_component`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The entity is not alive in this world.
    UnknownEntity {
        /// The offending identity.
        entity: EntityId,
    },
    /// A component or tag was mutated on an entity flagged immutable.
    ImmutableEntity {
        /// The immutable entity.
        entity: EntityId,
    },
    /// Removal was attempted on an entity flagged permanent.
    PermanentEntity {
        /// The permanent entity.
        entity: EntityId,
    },
    /// A component identity was used with a record type of a different size
    /// than the one fixed at its first use.
    SizeMismatch {
        /// The component kind.
        kind: ComponentId,
        /// Size recorded at first use.
        expected: usize,
        /// Size of the record type supplied now.
        actual: usize,
    },
    /// A component identity was accessed through the wrong storage variant.
    WrongStorage {
        /// The component kind.
        kind: ComponentId,
        /// What the caller needed (e.g. "dense").
        expected: &'static str,
    },
    /// A component identity was never registered in this world.
    UnknownComponent {
        /// The unregistered kind.
        kind: ComponentId,
    },
    /// A container index was outside its live bounds.
    OutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The number of live elements.
        len: usize,
    },
    /// An arena region handle outlived the arena generation it was made in.
    StaleRegion {
        /// Generation encoded in the handle.
        region_generation: u32,
        /// The arena's current generation.
        arena_generation: u32,
    },
    /// A displaced-set value was bit-identical to the set's tombstone.
    TombstoneValue {
        /// Absolute key being written.
        key: u32,
    },
    /// An integer-mode sparse set was given a value that differs from its key.
    KeyMismatch {
        /// Key supplied.
        key: u32,
        /// Key derived from the value.
        value_key: u32,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEntity { entity } => write!(f, "entity {entity} is not alive"),
            Self::ImmutableEntity { entity } => {
                write!(f, "entity {entity} is immutable and cannot be mutated")
            }
            Self::PermanentEntity { entity } => {
                write!(f, "entity {entity} is permanent and cannot be removed")
            }
            Self::SizeMismatch {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "component {kind} size mismatch: registered {expected} bytes, got {actual} bytes"
            ),
            Self::WrongStorage { kind, expected } => {
                write!(f, "component {kind} is not backed by {expected} storage")
            }
            Self::UnknownComponent { kind } => write!(f, "component {kind} is not registered"),
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::StaleRegion {
                region_generation,
                arena_generation,
            } => write!(
                f,
                "stale region: generation {region_generation}, arena generation {arena_generation}"
            ),
            Self::TombstoneValue { key } => {
                write!(f, "value written at key {key} equals the tombstone pattern")
            }
            Self::KeyMismatch { key, value_key } => write!(
                f,
                "integer-mode set given key {key} for a value keyed {value_key}"
            ),
        }
    }
}

impl Error for Violation {}

impl Violation {
    /// Abort with this violation's diagnostic.
    #[track_caller]
    pub fn raise(self) -> ! {
        panic!("{self}")
    }
}

/// Errors detected while validating a world or arena configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Arena block size is zero.
    ZeroBlockSize,
    /// Arena block size is not a multiple of the maximum alignment.
    UnalignedBlockSize {
        /// The configured block size.
        block_size: usize,
        /// The alignment it must be a multiple of.
        max_align: usize,
    },
    /// Maximum alignment is zero or not a power of two.
    InvalidAlignment {
        /// The configured alignment.
        max_align: usize,
    },
    /// A capacity hint exceeds the identity space.
    CapacityOverflow {
        /// Which hint overflowed.
        what: &'static str,
        /// The offending value.
        value: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockSize => write!(f, "arena block size must be non-zero"),
            Self::UnalignedBlockSize {
                block_size,
                max_align,
            } => write!(
                f,
                "arena block size {block_size} is not a multiple of alignment {max_align}"
            ),
            Self::InvalidAlignment { max_align } => {
                write!(f, "max alignment {max_align} must be a non-zero power of two")
            }
            Self::CapacityOverflow { what, value } => {
                write!(f, "{what} capacity {value} exceeds u32::MAX")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_messages_name_the_invariant() {
        let v = Violation::PermanentEntity {
            entity: EntityId(4),
        };
        assert_eq!(v.to_string(), "entity 4 is permanent and cannot be removed");
    }

    #[test]
    #[should_panic(expected = "entity 2 is immutable")]
    fn raise_panics_with_message() {
        Violation::ImmutableEntity {
            entity: EntityId(2),
        }
        .raise();
    }

    #[test]
    fn config_error_display() {
        let e = ConfigError::UnalignedBlockSize {
            block_size: 100,
            max_align: 16,
        };
        assert!(e.to_string().contains("100"));
    }
}
