//! Integration test: end-to-end world scenarios.
//!
//! Covers entity lifecycle with id recycling, component round trips,
//! relation sharing and teardown, prefabs, and resources through the
//! public `World` API only.

use burrow_core::{EntityFlags, RelationTarget};
use burrow_test_utils::{
    test_world, Burning, DiesBy, Enemy, Health, Player, Position, Tick, Velocity,
};

// ── Entity lifecycle ─────────────────────────────────────────────────

#[test]
fn position_round_trip_and_id_reuse() {
    let mut world = test_world(16);
    let e0 = world.add_entity();
    world.set_component(e0, Position::new(1.0, 2.0));
    assert_eq!(world.get_component::<Position>(e0), Some(&Position::new(1.0, 2.0)));

    world.remove_entity(e0);
    assert!(!world.has_entity(e0));

    let e1 = world.add_entity();
    assert_eq!(e1, e0, "freed id is reused once queued");
    assert!(!world.has_component::<Position>(e1), "reused id starts empty");
}

#[test]
fn fresh_ids_until_something_is_freed() {
    let mut world = test_world(16);
    let a = world.add_entity();
    let b = world.add_entity();
    assert_ne!(a, b);
    world.remove_entity(a);
    let c = world.add_entity();
    let d = world.add_entity();
    assert_eq!(c, a);
    assert!(d.0 > b.0);
    assert_eq!(world.entity_count(), 3);
}

#[test]
fn removal_clears_every_component_and_tag() {
    let mut world = test_world(16);
    let e = world.add_entity();
    world.set_component(e, Position::new(0.0, 0.0));
    world.set_component(e, Velocity::new(1.0, 1.0));
    world.set_component(e, Health::full(10));
    world.add_tag::<Enemy>(e);
    assert_eq!(world.components_of(e).count(), 4);

    world.remove_entity(e);
    let reused = world.add_entity();
    assert_eq!(reused, e);
    assert_eq!(world.components_of(reused).count(), 0);
    assert!(!world.has_tag::<Enemy>(reused));
}

#[test]
fn capacity_hint_is_not_a_limit() {
    let mut world = test_world(4);
    let ids: Vec<_> = (0..1000).map(|_| world.add_entity()).collect();
    for (i, &e) in ids.iter().enumerate() {
        world.set_component(e, Health::full(i as u32));
    }
    assert_eq!(world.get_component::<Health>(ids[999]), Some(&Health::full(999)));
    assert_eq!(world.entity_count(), 1000);
}

// ── Relations ────────────────────────────────────────────────────────

#[test]
fn dies_by_relation_per_source() {
    let mut world = test_world(16);
    let burning = world.tag_target::<Burning>();
    let e0 = world.add_entity();
    let e1 = world.add_entity();

    world.set_component_relation(e0, DiesBy { cause: 1 }, burning);
    world.set_component_relation(e1, DiesBy { cause: 2 }, burning);

    assert_eq!(
        world.get_component_relation::<DiesBy>(e0, burning),
        Some(&DiesBy { cause: 1 })
    );
    assert_eq!(
        world.get_component_relation::<DiesBy>(e1, burning),
        Some(&DiesBy { cause: 2 })
    );

    let r0 = world.relation_entity(e0, burning).unwrap();
    let r1 = world.relation_entity(e1, burning).unwrap();
    assert_ne!(r0, r1);
    assert!(world.flags(r0).contains(EntityFlags::RELATION | EntityFlags::PERMANENT));
    assert!(world.flags(e0).is_permanent(), "sources are pinned");

    let dies_by = world.component_id::<DiesBy>();
    let pair = world.pair_id::<DiesBy>(burning);
    let records = |world: &burrow_world::World| world.column(dies_by).unwrap().entry_count();
    let refs = |world: &burrow_world::World| world.column(pair).unwrap().entry_count();
    assert_eq!((records(&world), refs(&world)), (2, 2));

    assert_eq!(
        world.remove_component_relation::<DiesBy>(e0, burning),
        Some(DiesBy { cause: 1 })
    );
    assert!(!world.has_entity(r0));
    assert!(world.has_entity(r1));
    assert!(!world.column(dies_by).unwrap().has(r0));
    assert!(!world.column(pair).unwrap().has(e0));
    assert_eq!((records(&world), refs(&world)), (1, 1));
    assert!(!world.flags(e0).is_permanent(), "pin lifted with the last relation");

    assert_eq!(
        world.remove_component_relation::<DiesBy>(e1, burning),
        Some(DiesBy { cause: 2 })
    );
    assert!(!world.has_entity(r1));
    assert!(!world.column(dies_by).unwrap().has(r1));
    assert_eq!((records(&world), refs(&world)), (0, 0));
    assert_eq!(world.entity_count(), 2);

    world.remove_entity(e0);
    assert!(!world.has_entity(e0));
}

#[test]
#[should_panic(expected = "is permanent")]
fn relation_source_cannot_be_removed() {
    let mut world = test_world(16);
    let burning = world.tag_target::<Burning>();
    let e = world.add_entity();
    world.set_component_relation(e, DiesBy { cause: 1 }, burning);
    world.remove_entity(e);
}

#[test]
fn unpinned_source_removal_tears_down_relations() {
    let mut world = test_world(16);
    let burning = world.tag_target::<Burning>();
    let e = world.add_entity();
    world.set_component_relation(e, DiesBy { cause: 1 }, burning);
    let r = world.relation_entity(e, burning).unwrap();
    let dies_by = world.component_id::<DiesBy>();
    world.set_permanent(e, false);
    world.remove_entity(e);
    assert!(!world.has_entity(r));
    assert_eq!(world.column(dies_by).unwrap().entry_count(), 0);
}

#[test]
fn relation_to_entity_target() {
    let mut world = test_world(16);
    let hunter = world.add_entity();
    let prey = world.add_entity();
    world.set_component_relation(hunter, Health::full(3), prey);
    assert!(world.has_component_relation::<Health>(hunter, prey));
    assert!(!world.has_component_relation::<Health>(prey, hunter));
    assert_eq!(
        world.relations_of(hunter),
        vec![(RelationTarget::Entity(prey), world.relation_entity(hunter, prey).unwrap())]
    );
}

#[test]
fn relation_survives_target_removal() {
    let mut world = test_world(16);
    let a = world.add_entity();
    let b = world.add_entity();
    world.set_component_relation(a, DiesBy { cause: 5 }, b);
    world.remove_entity(b);
    assert_eq!(
        world.get_component_relation::<DiesBy>(a, b),
        Some(&DiesBy { cause: 5 })
    );
}

#[test]
#[should_panic(expected = "is immutable")]
fn immutable_source_rejects_relations() {
    let mut world = test_world(16);
    let a = world.add_entity();
    let b = world.add_entity();
    world.set_immutable(a, true);
    world.set_component_relation(a, DiesBy { cause: 1 }, b);
}

// ── Prefabs ──────────────────────────────────────────────────────────

#[test]
fn prefab_instances_are_independent() {
    let mut world = test_world(16);
    let goblin = world.add_entity();
    world.set_component(goblin, Health::full(7));
    world.add_tag::<Enemy>(goblin);
    world.set_prefab(goblin);

    let a = world.add_entity_from_prefab(goblin);
    let b = world.add_entity_from_prefab(goblin);
    world.get_component_mut::<Health>(a).unwrap().current = 1;

    assert_eq!(world.get_component::<Health>(a), Some(&Health { current: 1, max: 7 }));
    assert_eq!(world.get_component::<Health>(b), Some(&Health::full(7)));
    assert_eq!(world.get_component::<Health>(goblin), Some(&Health::full(7)));
    assert!(world.has_tag::<Enemy>(b));
    assert!(!world.flags(a).is_permanent());
}

#[test]
#[should_panic(expected = "is permanent")]
fn prefab_cannot_be_removed() {
    let mut world = test_world(16);
    let p = world.add_entity();
    world.set_prefab(p);
    world.remove_entity(p);
}

// ── Change tracking ──────────────────────────────────────────────────

#[test]
fn checksum_detects_kind_changes() {
    let mut world = test_world(16);
    let e = world.add_entity();
    world.set_component(e, Position::new(0.0, 0.0));
    let before = world.component_checksum(e);
    world.set_component(e, Position::new(5.0, 5.0));
    assert_eq!(world.component_checksum(e), before, "values do not matter");
    world.add_tag::<Player>(e);
    assert_ne!(world.component_checksum(e), before);
    world.remove_tag::<Player>(e);
    assert_eq!(world.component_checksum(e), before);
}

#[test]
fn changed_flag_round_trip() {
    let mut world = test_world(16);
    let e = world.add_entity();
    assert!(!world.flags(e).contains(EntityFlags::CHANGED));
    world.add_tag::<Player>(e);
    assert!(world.flags(e).contains(EntityFlags::CHANGED));
    world.clear_changed(e);
    assert_eq!(world.flags(e), EntityFlags::empty());
}

// ── Resources ────────────────────────────────────────────────────────

#[test]
fn resources_are_world_singletons() {
    let mut world = test_world(16);
    world.add_resource(Tick {
        step: 1,
        dt: 0.016,
        _pad: 0,
    });
    world.add_resource(Health::full(3));
    world.get_resource_mut::<Tick>().unwrap().step += 1;
    assert_eq!(world.get_resource::<Tick>().map(|t| t.step), Some(2));
    assert_eq!(world.remove_resource::<Health>(), Some(Health::full(3)));
    assert!(world.has_resource::<Tick>());
    assert!(!world.has_resource::<Health>());
}
