//! Column-major archetype tables.
//!
//! A table owns every entity of one archetype: an id column parallel to one
//! data column per component type, in signature order. Free rows form an
//! intrusive stack threaded through the id column, so removal is O(1) and
//! freed rows are reused before the table grows.

use std::collections::{HashMap, HashSet};

use trestle_foundation::{ComponentId, Entity, Error, Result, Value};

use crate::index::{RowId, TableId};
use crate::signature::Signature;

/// End marker of the intrusive free-row stack.
const FREE_END: u32 = u32::MAX;

#[allow(clippy::cast_possible_truncation)]
const fn decode_link(link: u32) -> Option<RowId> {
    if link == FREE_END {
        None
    } else {
        Some(RowId::from_raw(link as u16))
    }
}

/// Column store for one archetype.
///
/// The signature never mutates after construction; the columns grow and
/// shrink (logically) as entities migrate in and out. `with_edges` and
/// `without_edges` cache the neighbouring tables on the archetype graph,
/// keyed by the component added or removed; they are populated lazily by
/// the table index.
#[derive(Debug)]
pub struct Table {
    id: TableId,
    signature: Signature,
    /// Entity identifiers for occupied rows, free-list links for free rows.
    id_column: Vec<u32>,
    columns: Vec<Vec<Option<Value>>>,
    free_head: Option<RowId>,
    occupied: usize,
    with_edges: HashMap<ComponentId, TableId>,
    without_edges: HashMap<ComponentId, TableId>,
}

impl Table {
    pub(crate) fn new(id: TableId, signature: Signature) -> Self {
        let columns = vec![Vec::new(); signature.len()];
        Self {
            id,
            signature,
            id_column: Vec::new(),
            columns,
            free_head: None,
            occupied: 0,
            with_edges: HashMap::new(),
            without_edges: HashMap::new(),
        }
    }

    /// Returns this table's identifier.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns this table's signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the number of occupied rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns true if no row is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns the number of data columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the largest row ever occupied, or `None` for a table that
    /// never held an entity. Rows above this mark are unused.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn high_water_mark(&self) -> Option<RowId> {
        self.id_column
            .len()
            .checked_sub(1)
            .map(|row| RowId::from_raw(row as u16))
    }

    /// Places `entity` in this table and returns its row.
    ///
    /// Freed rows are reused first; otherwise the columns grow.
    /// The data cells of the new row start absent and must be written
    /// before they are read.
    ///
    /// # Errors
    ///
    /// Fails if the table is at its 65 536-row cap.
    pub fn add(&mut self, entity: Entity) -> Result<RowId> {
        let row = if let Some(row) = self.free_head {
            self.free_head = decode_link(self.id_column[row.index()]);
            self.id_column[row.index()] = entity.id();
            row
        } else {
            let row = u16::try_from(self.id_column.len()).map_err(|_| {
                Error::internal(format!("row space exhausted in table {}", self.id.raw()))
            })?;
            self.id_column.push(entity.id());
            for column in &mut self.columns {
                column.push(None);
            }
            RowId::from_raw(row)
        };
        self.occupied += 1;
        Ok(row)
    }

    /// Frees `row`, pushing it onto the free-row stack and clearing every
    /// data cell. Returns the entity that occupied the row.
    pub fn remove(&mut self, row: RowId) -> Entity {
        let entity = Entity::from_raw(self.id_column[row.index()]);
        self.id_column[row.index()] = self.free_head.map_or(FREE_END, |head| u32::from(head.raw()));
        self.free_head = Some(row);
        for column in &mut self.columns {
            column[row.index()] = None;
        }
        self.occupied -= 1;
        entity
    }

    /// Returns the entity occupying `row`.
    ///
    /// Only meaningful for occupied rows; a free row yields whatever link
    /// the free stack stored there.
    #[must_use]
    pub fn entity_at(&self, row: RowId) -> Entity {
        Entity::from_raw(self.id_column[row.index()])
    }

    /// Reads the cell at `(column, row)`, or `None` if the cell was never
    /// written (or was cleared by removal).
    #[must_use]
    pub fn cell(&self, column: usize, row: RowId) -> Option<&Value> {
        self.columns[column][row.index()].as_ref()
    }

    /// Writes the cell at `(column, row)`.
    pub fn write_cell(&mut self, column: usize, row: RowId, value: Value) {
        self.columns[column][row.index()] = Some(value);
    }

    /// Takes the cell at `(column, row)`, leaving it absent.
    pub fn take_cell(&mut self, column: usize, row: RowId) -> Option<Value> {
        self.columns[column][row.index()].take()
    }

    /// Returns the cached neighbour for adding `component`, if populated.
    #[must_use]
    pub fn with_edge(&self, component: ComponentId) -> Option<TableId> {
        self.with_edges.get(&component).copied()
    }

    /// Returns the cached neighbour for removing `component`, if populated.
    #[must_use]
    pub fn without_edge(&self, component: ComponentId) -> Option<TableId> {
        self.without_edges.get(&component).copied()
    }

    pub(crate) fn set_with_edge(&mut self, component: ComponentId, table: TableId) {
        self.with_edges.insert(component, table);
    }

    pub(crate) fn set_without_edge(&mut self, component: ComponentId, table: TableId) {
        self.without_edges.insert(component, table);
    }

    /// Iterates the occupied rows, each visited exactly once.
    ///
    /// The iterator walks from the high-water mark down, skipping rows on
    /// the free stack. It borrows the table, so mutation during iteration
    /// is ruled out by the borrow checker; the multi-cursor machinery the
    /// archetype-graph literature describes for concurrent iteration is
    /// unnecessary under the drain discipline.
    #[must_use]
    pub fn rows(&self) -> Rows<'_> {
        let mut free = HashSet::new();
        let mut cursor = self.free_head;
        while let Some(row) = cursor {
            free.insert(row.raw());
            cursor = decode_link(self.id_column[row.index()]);
        }
        Rows {
            table: self,
            next: self.id_column.len(),
            free,
        }
    }
}

/// Iterator over a table's occupied rows, highest row first.
#[derive(Debug)]
pub struct Rows<'a> {
    table: &'a Table,
    next: usize,
    free: HashSet<u16>,
}

impl Iterator for Rows<'_> {
    type Item = (RowId, Entity);

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Self::Item> {
        while self.next > 0 {
            self.next -= 1;
            let row = self.next as u16;
            if self.free.contains(&row) {
                continue;
            }
            let row = RowId::from_raw(row);
            return Some((row, self.table.entity_at(row)));
        }
        None
    }
}
