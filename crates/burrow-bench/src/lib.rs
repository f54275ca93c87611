//! Benchmark profiles for the Burrow entity store.
//!
//! - [`reference_world`]: 10K entities, a third of them moving, a tenth
//!   tagged as enemies
//! - [`churn`]: remove and re-add a slice of entities to exercise id
//!   recycling

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use burrow_core::EntityId;
use burrow_test_utils::{spawn_grid, test_world, Enemy, Health};
use burrow_world::World;

/// Entity count of the reference profile.
pub const REFERENCE_ENTITIES: u32 = 10_000;

/// Build the reference benchmark world.
pub fn reference_world() -> (World, Vec<EntityId>) {
    let mut world = test_world(REFERENCE_ENTITIES as usize);
    let ids = spawn_grid(&mut world, REFERENCE_ENTITIES, 3);
    for (i, &e) in ids.iter().enumerate() {
        if i % 10 == 0 {
            world.add_tag::<Enemy>(e);
            world.set_component(e, Health::full(100));
        }
    }
    (world, ids)
}

/// Remove every `stride`-th entity and spawn the same number again.
pub fn churn(world: &mut World, ids: &mut [EntityId], stride: usize) {
    for e in ids.iter_mut().step_by(stride) {
        world.remove_entity(*e);
        *e = world.add_entity();
    }
}
