//! World configuration and validation.

use burrow_arena::ArenaConfig;
use burrow_core::ConfigError;

/// Construction parameters for a [`World`](crate::World).
///
/// Capacities are hints used to pre-size containers. They are not limits:
/// every container grows past them on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Expected number of simultaneously live entities.
    pub entity_capacity: usize,
    /// Expected number of component kinds (tags and pair kinds included).
    pub component_capacity: usize,
    /// Expected number of resource kinds.
    pub resource_capacity: usize,
    /// Block sizing for each of the world's arenas.
    pub arena: ArenaConfig,
}

impl WorldConfig {
    /// Default entity capacity hint.
    pub const DEFAULT_ENTITY_CAPACITY: usize = 1024;
    /// Default component-kind capacity hint.
    pub const DEFAULT_COMPONENT_CAPACITY: usize = 64;
    /// Default resource-kind capacity hint.
    pub const DEFAULT_RESOURCE_CAPACITY: usize = 16;

    /// A configuration sized for `entity_capacity` entities.
    pub fn new(entity_capacity: usize) -> Self {
        Self {
            entity_capacity,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arena.validate()?;
        for (what, value) in [
            ("entity", self.entity_capacity),
            ("component", self.component_capacity),
            ("resource", self.resource_capacity),
        ] {
            if u32::try_from(value).is_err() {
                return Err(ConfigError::CapacityOverflow { what, value });
            }
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: Self::DEFAULT_ENTITY_CAPACITY,
            component_capacity: Self::DEFAULT_COMPONENT_CAPACITY,
            resource_capacity: Self::DEFAULT_RESOURCE_CAPACITY,
            arena: ArenaConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
        assert_eq!(WorldConfig::new(16).entity_capacity, 16);
    }

    #[test]
    fn bad_arena_is_rejected() {
        let config = WorldConfig {
            arena: ArenaConfig::new(0),
            ..WorldConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlockSize));
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        if usize::BITS <= 32 {
            return;
        }
        let config = WorldConfig::new(u32::MAX as usize + 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CapacityOverflow { what: "entity", .. })
        ));
    }
}
