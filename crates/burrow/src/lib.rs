//! Burrow: an arena-backed entity/component store.
//!
//! This is the facade crate that re-exports the public API from all Burrow
//! sub-crates. For most users, adding `burrow` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use burrow::prelude::*;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
//! #[repr(C)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
//! #[repr(C)]
//! struct DiesBy { cause: u32 }
//!
//! struct Burning;
//!
//! let mut world = World::new(WorldConfig::new(16)).unwrap();
//! let e = world.add_entity();
//! world.set_component(e, Position { x: 1.0, y: 2.0 });
//!
//! let burning = world.tag_target::<Burning>();
//! world.set_component_relation(e, DiesBy { cause: 3 }, burning);
//! assert_eq!(world.get_component_relation::<DiesBy>(e, burning).map(|d| d.cause), Some(3));
//!
//! let query = world.query().with::<Position>().build();
//! let mut ctx = QueryContext::new();
//! let result = ctx.run(&world, &query);
//! assert_eq!(result.entities(), &[e]);
//! assert_eq!(result.get::<Position>(&world, 0), Some(&Position { x: 1.0, y: 2.0 }));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `burrow-core` | Identities, `KindMask`, `EntityFlags`, errors, checksum |
//! | [`arena`] | `burrow-arena` | Arena allocator, `Region`, `List`, `Queue`, `Span` |
//! | [`index`] | `burrow-index` | Displaced, counted, and sparse sets; `HiBitSet` |
//! | [`world`] | `burrow-world` | `World`, storages, relations, resources, queries |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`burrow-core`).
pub use burrow_core as types;

/// Arena allocator and the containers built on it (`burrow-arena`).
pub use burrow_arena as arena;

/// Index structures (`burrow-index`).
///
/// [`index::HiBitSet`] backs component presence; the set types back the
/// entity table, relation counts, and dense storages.
pub use burrow_index as index;

/// The world façade and queries (`burrow-world`).
pub use burrow_world as world;

/// Common imports for typical usage.
///
/// ```rust
/// use burrow::prelude::*;
/// ```
pub mod prelude {
    pub use burrow_core::{
        Checksum, Component, ComponentId, ConfigError, EntityFlags, EntityId, RelationTarget,
        ResourceId, Violation,
    };
    pub use burrow_world::{
        CacheOutcome, Query, QueryContext, QueryResult, RecordLoc, World, WorldConfig,
    };
}
