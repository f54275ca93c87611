//! Index structures for the Burrow entity store.
//!
//! All arena-backed structures here follow the arena crate's convention:
//! they hold [`burrow_arena::Region`] handles and take the [`Arena`] as a
//! parameter on each call.
//!
//! - [`DisplacedSet`]: dense array over a sliding key window, tombstone
//!   deletion.
//! - [`CountedSet`]: displaced set with per-key reference counts.
//! - [`SparseSet`]: key to dense-index map with swap-remove compaction.
//! - [`PagedSparseSet`]: eight sparse sets partitioned by key bit-length.
//! - [`HiBitSet`]: layered bitset with fast bit skipping and set algebra.
//!
//! [`Arena`]: burrow_arena::Arena

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod counted;
pub mod displaced;
pub mod hibitset;
pub mod paged;
pub mod sparse;

pub use counted::CountedSet;
pub use displaced::DisplacedSet;
pub use hibitset::{HiBitSet, HiBitSetIter};
pub use paged::PagedSparseSet;
pub use sparse::SparseSet;
