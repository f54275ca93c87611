//! The Burrow world: entities, components, tags, relations, resources,
//! and cached queries.
//!
//! # Architecture
//!
//! ```text
//! World
//! ├── Registry          TypeId → ComponentId, (kind, target) → pair kind
//! ├── WorldEntities     live ids (paged sparse set) + FIFO free queue
//! ├── WorldComponents   one lazily created Storage per kind
//! │                     (dense / unit / indirect, presence as HiBitSet)
//! ├── WorldRelations    (source, target) → hidden relation entity, refcounted
//! └── WorldResources    one record per resource kind
//!
//! QueryContext          rank-bucketed cache of query results
//! ```
//!
//! Each layer owns its own [`burrow_arena::Arena`]; the world itself is the
//! only value that is not arena-backed.
//!
//! # Example
//!
//! ```
//! use burrow_world::{QueryContext, World, WorldConfig};
//!
//! #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
//! #[repr(C)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new(WorldConfig::new(16)).unwrap();
//! let e = world.add_entity();
//! world.set_component(e, Position { x: 1.0, y: 2.0 });
//!
//! let query = world.query().with::<Position>().build();
//! let mut ctx = QueryContext::new();
//! assert_eq!(ctx.run(&world, &query).entities(), &[e]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod components;
pub mod config;
pub mod entities;
pub mod query;
pub mod registry;
pub mod relations;
pub mod resources;
pub mod storage;
pub mod world;

pub use components::WorldComponents;
pub use config::WorldConfig;
pub use entities::WorldEntities;
pub use query::{CacheOutcome, Query, QueryBuilder, QueryContext, QueryResult};
pub use registry::{ComponentInfo, Registry, ResourceInfo, StorageClass};
pub use relations::WorldRelations;
pub use resources::WorldResources;
pub use storage::{ComponentColumn, RecordLoc, Storage, StorageKind};
pub use world::World;
