//! Core types for the Burrow entity store.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identities, the [`KindMask`] query key, the per-entity
//! [`EntityFlags`], the component checksum, and the error types shared by
//! the arena, index, and world crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod checksum;
pub mod error;
pub mod flags;
pub mod id;
pub mod kind_mask;

pub use checksum::Checksum;
pub use error::{ConfigError, Violation};
pub use flags::EntityFlags;
pub use id::{ComponentId, EntityId, RelationTarget, ResourceId};
pub use kind_mask::KindMask;

/// Marker trait for records that can live in a component or resource storage.
///
/// Records are plain old data: the arena stores their raw bytes and hands
/// out typed views through `bytemuck` casts. Implemented automatically for
/// every `Pod + Send + Sync + 'static` type.
pub trait Component: bytemuck::Pod + Send + Sync + 'static {}

impl<T: bytemuck::Pod + Send + Sync + 'static> Component for T {}
