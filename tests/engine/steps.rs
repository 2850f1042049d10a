//! Integration tests for step transactions.
//!
//! Covers snapshot reads, deferred writes, command ordering, and the
//! busy-flag discipline.

use trestle_engine::{select_entities, Engine};
use trestle_foundation::{ComponentId, ErrorKind, Value};

fn c(id: u32) -> ComponentId {
    ComponentId::from_raw(id)
}

// =============================================================================
// Snapshot reads
// =============================================================================

#[test]
fn reads_inside_a_step_see_the_pre_step_state() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();
    engine.add_component(entity, c(1), Value::Int(10)).unwrap();

    engine
        .step(|scope| {
            scope.set_component(entity, c(1), Value::Int(20));
            scope.remove_component(entity, c(1));

            // Neither write is visible yet.
            assert_eq!(scope.get_component(entity, c(1)).unwrap(), Value::Int(10));
            assert!(scope.has_component(entity, c(1)).unwrap());
        })
        .unwrap();

    assert_eq!(engine.get_component_or_none(entity, c(1)).unwrap(), None);
}

#[test]
fn repeated_reads_are_stable_within_a_step() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();
    engine.add_component(entity, c(1), Value::Int(0)).unwrap();

    engine
        .step(|scope| {
            let first = scope.get_component(entity, c(1)).unwrap();
            scope.set_component(entity, c(1), Value::Int(99));
            let second = scope.get_component(entity, c(1)).unwrap();
            assert_eq!(first, second);
        })
        .unwrap();
}

// =============================================================================
// Deferred writes
// =============================================================================

#[test]
fn add_then_set_lands_the_set_value() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();

    engine
        .step(|scope| {
            scope.add_component(entity, c(1), Value::Int(1));
            scope.set_component(entity, c(1), Value::Int(2));
            scope.set_component(entity, c(1), Value::Int(3));
        })
        .unwrap();

    assert_eq!(engine.get_component(entity, c(1)).unwrap(), Value::Int(3));
}

#[test]
fn destroy_then_add_surfaces_invalid_entity() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();

    let err = engine
        .step(|scope| {
            scope.destroy_entity(entity);
            scope.add_component(entity, c(1), Value::Int(1));
        })
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidEntity(_)));
}

#[test]
fn drafted_entities_accept_queued_components() {
    let engine = Engine::new();

    let entity = engine
        .step(|scope| {
            let entity = scope.new_entity();
            scope.add_component(entity, c(1), Value::Int(7));
            entity
        })
        .unwrap();

    assert!(engine.exists(entity));
    assert_eq!(engine.get_component(entity, c(1)).unwrap(), Value::Int(7));
}

#[test]
fn next_identifiers_advance_by_the_number_of_drafts() {
    let engine = Engine::new();
    let before = engine.step(|scope| scope.new_entity()).unwrap();

    engine
        .step(|scope| {
            for _ in 0..4 {
                scope.new_entity();
            }
        })
        .unwrap();

    let after = engine.step(|scope| scope.new_entity()).unwrap();
    assert_eq!(after.id() - before.id(), 5);
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn for_each_visits_matching_archetypes_only() {
    let engine = Engine::new();
    let tagged = engine.new_entity().unwrap();
    let untagged = engine.new_entity().unwrap();
    engine.add_component(tagged, c(1), Value::Bool(true)).unwrap();

    let query = select_entities().with(c(1)).build();
    let matched = engine
        .step(|scope| scope.entities_matching(&query))
        .unwrap();

    assert_eq!(matched, vec![tagged]);
    assert!(!matched.contains(&untagged));
}

#[test]
fn iteration_reflects_the_snapshot_not_the_queue() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();
    engine.add_component(entity, c(1), Value::Bool(true)).unwrap();

    let query = select_entities().with(c(1)).build();
    engine
        .step(|scope| {
            scope.remove_component(entity, c(1));
            let drafted = scope.new_entity();
            scope.add_component(drafted, c(1), Value::Bool(true));

            // Still exactly the pre-step population.
            assert_eq!(scope.entities_matching(&query), vec![entity]);
        })
        .unwrap();
}

// =============================================================================
// Exclusivity
// =============================================================================

#[test]
fn mutating_directly_during_a_step_is_rejected() {
    let engine = Engine::new();
    let entity = engine.new_entity().unwrap();

    engine
        .step(|_| {
            for err in [
                engine.new_entity().unwrap_err(),
                engine.destroy_entity(entity).unwrap_err(),
                engine.add_component(entity, c(1), Value::Int(1)).unwrap_err(),
                engine.set_component(entity, c(1), Value::Int(1)).unwrap_err(),
            ] {
                assert!(matches!(err.kind, ErrorKind::ConcurrentStep));
            }

            // Reads stay available.
            assert!(engine.exists(entity));
        })
        .unwrap();
}

#[test]
fn step_result_passes_through() {
    let engine = Engine::new();
    let out = engine.step(|_| "done").unwrap();
    assert_eq!(out, "done");
}
