//! Block-chained bump arena for the Burrow entity store.
//!
//! Every container in the store allocates its backing bytes from an
//! [`Arena`]. Memory is only ever released as a whole; individual regions
//! are abandoned rather than freed.
//!
//! # Architecture
//!
//! ```text
//! Arena
//! ├── buffers: owned, 16-byte aligned backing memory
//! ├── blocks: Block[] (views into buffers; carved tails are borrowed views)
//! └── generation (bumped by free(); stale Region handles are rejected)
//!
//! List<T>   → one Region, doubled on growth, halved at ¼ occupancy
//! Queue<T>  → List<T> + front offset, compacted past half consumption
//! Span      → half-open interval arithmetic
//! ```
//!
//! Containers never hold a reference to their arena. They store a
//! [`Region`] handle and take the arena as a parameter on every call, so
//! a region moving during `realloc` can never leave a dangling pointer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod block;
pub mod config;
pub mod handle;
pub mod list;
pub mod queue;
pub mod span;

pub use arena::{Arena, ReallocStrategy};
pub use config::ArenaConfig;
pub use handle::Region;
pub use list::List;
pub use queue::Queue;
pub use span::Span;
