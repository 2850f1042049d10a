//! Integration tests for the archetype table graph.
//!
//! Covers table creation, edge caching, row reuse, and migration.

use std::collections::HashSet;

use trestle_foundation::{ComponentId, Entity, Value};
use trestle_storage::{RowId, Signature, TableId, TableIndex};

fn c(id: u32) -> ComponentId {
    ComponentId::from_raw(id)
}

fn e(id: u32) -> Entity {
    Entity::from_raw(id)
}

// =============================================================================
// Graph resolution
// =============================================================================

#[test]
fn one_table_per_signature() {
    let mut index = TableIndex::new();

    // Reach {1, 2} along both orders of the graph.
    let t1 = index.resolve_with(TableId::EMPTY, c(1)).unwrap();
    let t2 = index.resolve_with(TableId::EMPTY, c(2)).unwrap();
    let t12_via_1 = index.resolve_with(t1, c(2)).unwrap();
    let t12_via_2 = index.resolve_with(t2, c(1)).unwrap();

    assert_eq!(t12_via_1, t12_via_2);

    let sig = Signature::from_components(vec![c(1), c(2)]);
    assert_eq!(index.get_by_signature(&sig).unwrap().id(), t12_via_1);
}

#[test]
fn edges_are_coherent_with_signatures() {
    let mut index = TableIndex::new();
    let t1 = index.resolve_with(TableId::EMPTY, c(1)).unwrap();
    let t12 = index.resolve_with(t1, c(2)).unwrap();

    let from = index.get_by_id(t1).unwrap();
    assert_eq!(from.with_edge(c(2)), Some(t12));
    assert_eq!(
        index.get_by_id(t12).unwrap().signature(),
        &from.signature().with(c(2)).unwrap()
    );
}

#[test]
fn removal_edge_walks_back() {
    let mut index = TableIndex::new();
    let t1 = index.resolve_with(TableId::EMPTY, c(1)).unwrap();

    assert_eq!(index.resolve_without(t1, c(1)).unwrap(), TableId::EMPTY);
    assert_eq!(
        index.get_by_id(t1).unwrap().without_edge(c(1)),
        Some(TableId::EMPTY)
    );
}

// =============================================================================
// Row reuse
// =============================================================================

#[test]
fn freed_rows_are_reused_exactly() {
    let mut index = TableIndex::new();
    let table = index.get_mut(TableId::EMPTY).unwrap();

    // Populate 100 rows, free every second one.
    let rows: Vec<RowId> = (0..100u32).map(|i| table.add(e(i)).unwrap()).collect();
    let hwm = table.high_water_mark();

    let freed: HashSet<RowId> = rows.iter().copied().step_by(2).collect();
    for &row in &freed {
        table.remove(row);
    }

    // The next 50 additions land exactly on the freed rows.
    let reused: HashSet<RowId> = (0..50u32)
        .map(|i| table.add(e(100 + i)).unwrap())
        .collect();
    assert_eq!(reused, freed);
    assert_eq!(table.high_water_mark(), hwm);
    assert_eq!(table.len(), 100);
}

#[test]
fn iteration_skips_freed_rows() {
    let mut index = TableIndex::new();
    let table = index.get_mut(TableId::EMPTY).unwrap();

    let rows: Vec<RowId> = (0..10u32).map(|i| table.add(e(i)).unwrap()).collect();
    table.remove(rows[0]);
    table.remove(rows[9]);

    let seen: HashSet<Entity> = table.rows().map(|(_, entity)| entity).collect();
    assert_eq!(seen.len(), 8);
    assert!(!seen.contains(&e(0)));
    assert!(!seen.contains(&e(9)));
}

// =============================================================================
// Migration
// =============================================================================

#[test]
fn migration_chain_leaves_no_residue() {
    let mut index = TableIndex::new();
    let entity = e(0);

    let row = index.get_mut(TableId::EMPTY).unwrap().add(entity).unwrap();
    let (ta, row) = index
        .migrate_with(TableId::EMPTY, row, c(1), Value::Int(1))
        .unwrap();
    let (tab, row) = index.migrate_with(ta, row, c(2), Value::Int(2)).unwrap();

    // The intermediate tables hold no live rows.
    assert!(index.get_by_id(TableId::EMPTY).unwrap().is_empty());
    assert!(index.get_by_id(ta).unwrap().is_empty());

    let table = index.get_by_id(tab).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.entity_at(row), entity);
    assert_eq!(table.cell(0, row), Some(&Value::Int(1)));
    assert_eq!(table.cell(1, row), Some(&Value::Int(2)));
}

#[test]
fn migration_preserves_values_under_column_shift() {
    let mut index = TableIndex::new();
    let entity = e(0);

    // Build {10, 30}, then insert 20 between the existing columns.
    let row = index.get_mut(TableId::EMPTY).unwrap().add(entity).unwrap();
    let (t, row) = index
        .migrate_with(TableId::EMPTY, row, c(10), Value::from("ten"))
        .unwrap();
    let (t, row) = index
        .migrate_with(t, row, c(30), Value::from("thirty"))
        .unwrap();
    let (t, row) = index
        .migrate_with(t, row, c(20), Value::from("twenty"))
        .unwrap();

    let table = index.get_by_id(t).unwrap();
    assert_eq!(table.signature().components(), &[c(10), c(20), c(30)]);
    assert_eq!(table.cell(0, row), Some(&Value::from("ten")));
    assert_eq!(table.cell(1, row), Some(&Value::from("twenty")));
    assert_eq!(table.cell(2, row), Some(&Value::from("thirty")));

    // And drop the middle column again.
    let (t, row) = index.migrate_without(t, row, c(20)).unwrap();
    let table = index.get_by_id(t).unwrap();
    assert_eq!(table.signature().components(), &[c(10), c(30)]);
    assert_eq!(table.cell(0, row), Some(&Value::from("ten")));
    assert_eq!(table.cell(1, row), Some(&Value::from("thirty")));
}
