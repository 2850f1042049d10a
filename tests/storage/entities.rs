//! Integration tests for the entity index.
//!
//! Covers drafting, allocation, record bookkeeping, and tombstones.

use trestle_foundation::Entity;
use trestle_storage::{EntityIndex, Record, RowId, Slot, TableId};

fn rec(table: u16, row: u16) -> Record {
    Record::new(TableId::from_raw(table), RowId::from_raw(row))
}

// =============================================================================
// Allocation
// =============================================================================

#[test]
fn identifiers_are_dense_and_monotonic() {
    let mut index = EntityIndex::new();
    for expected in 0..100u32 {
        assert_eq!(index.alloc().id(), expected);
    }
    assert_eq!(index.next_id(), 100);
}

#[test]
fn draft_previews_the_next_allocation() {
    let mut index = EntityIndex::new();
    let draft = index.draft();
    assert_eq!(index.alloc(), draft);

    let draft = index.draft();
    assert_eq!(index.alloc(), draft);
}

#[test]
fn batch_allocation_is_contiguous_and_unassigned() {
    let mut index = EntityIndex::new();
    index.alloc();
    index.alloc();

    let (first, last) = index.alloc_batch(5);
    assert_eq!(first.id(), 2);
    assert_eq!(last.id(), 6);
    for id in first.id()..=last.id() {
        assert_eq!(index.slot(Entity::from_raw(id)), Some(Slot::Unassigned));
        assert_eq!(index.get(Entity::from_raw(id)), None);
    }
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn recorded_entities_resolve_to_their_location() {
    let mut index = EntityIndex::new();
    let a = index.alloc();
    let b = index.alloc();
    index.record(a, rec(0, 0)).unwrap();
    index.record(b, rec(0, 1)).unwrap();

    assert_eq!(index.get(a), Some(rec(0, 0)));
    assert_eq!(index.get(b), Some(rec(0, 1)));
    assert_eq!(index.live_count(), 2);
}

#[test]
fn migration_rewrites_the_record() {
    let mut index = EntityIndex::new();
    let e = index.alloc();
    index.record(e, rec(0, 0)).unwrap();
    index.record(e, rec(3, 9)).unwrap();

    assert_eq!(index.get(e), Some(rec(3, 9)));
    assert_eq!(index.live_count(), 1);
}

// =============================================================================
// Tombstones
// =============================================================================

#[test]
fn removal_is_permanent() {
    let mut index = EntityIndex::new();
    let e = index.alloc();
    index.record(e, rec(0, 0)).unwrap();

    assert_eq!(index.remove(e).unwrap(), Slot::Live(rec(0, 0)));
    assert_eq!(index.get(e), None);

    // The identifier is never handed out again.
    let next = index.alloc();
    assert_ne!(next, e);
    assert!(index.record(e, rec(0, 1)).is_err());
}

#[test]
fn double_removal_reports_the_tombstone() {
    let mut index = EntityIndex::new();
    let e = index.alloc();
    index.record(e, rec(0, 0)).unwrap();
    index.remove(e).unwrap();

    assert_eq!(index.remove(e).unwrap(), Slot::Removed);
}

#[test]
fn out_of_range_lookups_are_none() {
    let index = EntityIndex::new();
    assert_eq!(index.get(Entity::from_raw(7)), None);
    assert_eq!(index.slot(Entity::from_raw(7)), None);
}
