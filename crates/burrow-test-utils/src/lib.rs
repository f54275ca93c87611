//! Shared fixtures and helpers for Burrow tests and benchmarks.
//!
//! [`fixtures`] holds the component, tag, and resource types used across
//! the workspace's tests. The helpers here build small worlds populated
//! with them.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use burrow_core::EntityId;
use burrow_world::{World, WorldConfig};

pub use fixtures::{Burning, DiesBy, Enemy, Health, Player, Position, Tick, Velocity};

/// A world sized for `capacity` entities with the default arena config.
pub fn test_world(capacity: usize) -> World {
    World::new(WorldConfig::new(capacity)).expect("default world config is valid")
}

/// Spawn `n` entities with a [`Position`] at `(i, i)` and, for every
/// `moving_every`-th one, a [`Velocity`] of `(1, 0)`.
pub fn spawn_grid(world: &mut World, n: u32, moving_every: u32) -> Vec<EntityId> {
    (0..n)
        .map(|i| {
            let e = world.add_entity();
            world.set_component(e, Position::new(i as f32, i as f32));
            if moving_every != 0 && i % moving_every == 0 {
                world.set_component(e, Velocity::new(1.0, 0.0));
            }
            e
        })
        .collect()
}

/// Sorted copy of `entities`, for order-insensitive comparisons.
pub fn sorted(entities: &[EntityId]) -> Vec<EntityId> {
    let mut v = entities.to_vec();
    v.sort_unstable();
    v
}
