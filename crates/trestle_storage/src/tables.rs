//! The table index: registry of every archetype table in an engine.
//!
//! Tables are found three ways, cheapest first: a graph edge cached on the
//! source table, the signature-key map, or creation on demand. Row
//! migration between neighbouring tables lives here too, since it is the
//! only operation that touches two tables at once.

use std::collections::HashMap;

use trestle_foundation::{ComponentId, Error, Result, Value};

use crate::index::{RowId, TableId};
use crate::signature::{Signature, SignatureKey};
use crate::table::Table;

/// Owns all archetype tables, dense by identifier, with a signature-key
/// map enforcing one table per signature.
///
/// The empty-signature table is created up front at [`TableId::EMPTY`].
#[derive(Debug)]
pub struct TableIndex {
    tables: Vec<Table>,
    by_signature: HashMap<SignatureKey, TableId>,
}

impl Default for TableIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TableIndex {
    /// Creates a table index holding only the empty-signature table.
    #[must_use]
    pub fn new() -> Self {
        let empty = Signature::empty();
        let mut by_signature = HashMap::new();
        by_signature.insert(empty.key(), TableId::EMPTY);
        Self {
            tables: vec![Table::new(TableId::EMPTY, empty)],
            by_signature,
        }
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Always false: the empty-signature table exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Looks a table up by identifier.
    #[must_use]
    pub fn get_by_id(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.index())
    }

    /// Looks a table up by identifier, mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: TableId) -> Option<&mut Table> {
        self.tables.get_mut(id.index())
    }

    /// Looks a table up by signature content.
    #[must_use]
    pub fn get_by_signature(&self, signature: &Signature) -> Option<&Table> {
        let id = *self.by_signature.get(&signature.key())?;
        self.get_by_id(id)
    }

    /// Iterates every table in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Finds or creates the table whose signature is `from`'s plus
    /// `component`, caching the edge on `from`.
    ///
    /// # Errors
    ///
    /// Fails if `component` is already in `from`'s signature, or if the
    /// table space is exhausted.
    pub fn resolve_with(&mut self, from: TableId, component: ComponentId) -> Result<TableId> {
        if let Some(id) = self.tables[from.index()].with_edge(component) {
            return Ok(id);
        }
        let signature = self.tables[from.index()].signature().with(component)?;
        let id = self.find_or_create(signature)?;
        // Only the forward edge is cached here; the inverse edge on the
        // destination fills in lazily on first traversal the other way.
        self.tables[from.index()].set_with_edge(component, id);
        Ok(id)
    }

    /// Finds or creates the table whose signature is `from`'s minus
    /// `component`, caching the edge on `from`.
    ///
    /// # Errors
    ///
    /// Fails if `component` is not in `from`'s signature, or if the table
    /// space is exhausted.
    pub fn resolve_without(&mut self, from: TableId, component: ComponentId) -> Result<TableId> {
        if let Some(id) = self.tables[from.index()].without_edge(component) {
            return Ok(id);
        }
        let signature = self.tables[from.index()].signature().without(component)?;
        let id = self.find_or_create(signature)?;
        self.tables[from.index()].set_without_edge(component, id);
        Ok(id)
    }

    /// Moves the entity at `(from, row)` to the neighbouring table that
    /// additionally carries `component`, writing `value` into the new
    /// column and shifting the remaining columns around it. Returns the
    /// new location.
    ///
    /// # Errors
    ///
    /// Fails if `component` is already in the source signature or the
    /// destination cannot accept a row.
    pub fn migrate_with(
        &mut self,
        from: TableId,
        row: RowId,
        component: ComponentId,
        value: Value,
    ) -> Result<(TableId, RowId)> {
        let dest = self.resolve_with(from, component)?;
        let (source, target) = self.pair_mut(from, dest);
        let inserted = target
            .signature()
            .index_of(component)
            .ok_or_else(|| Error::internal("destination table lost its new column"))?;

        let entity = source.entity_at(row);
        let new_row = target.add(entity)?;
        for column in 0..target.column_count() {
            if column == inserted {
                target.write_cell(column, new_row, value.clone());
            } else {
                let source_column = if column < inserted { column } else { column - 1 };
                if let Some(cell) = source.take_cell(source_column, row) {
                    target.write_cell(column, new_row, cell);
                }
            }
        }
        source.remove(row);
        Ok((dest, new_row))
    }

    /// Moves the entity at `(from, row)` to the neighbouring table without
    /// `component`, dropping that column and shifting the remaining
    /// columns around the gap. Returns the new location.
    ///
    /// # Errors
    ///
    /// Fails if `component` is not in the source signature or the
    /// destination cannot accept a row.
    pub fn migrate_without(
        &mut self,
        from: TableId,
        row: RowId,
        component: ComponentId,
    ) -> Result<(TableId, RowId)> {
        let dest = self.resolve_without(from, component)?;
        let removed = self.tables[from.index()]
            .signature()
            .index_of(component)
            .ok_or_else(|| Error::internal("source table lost the removed column"))?;
        let (source, target) = self.pair_mut(from, dest);

        let entity = source.entity_at(row);
        let new_row = target.add(entity)?;
        for source_column in 0..source.column_count() {
            if source_column == removed {
                continue;
            }
            let column = if source_column < removed {
                source_column
            } else {
                source_column - 1
            };
            if let Some(cell) = source.take_cell(source_column, row) {
                target.write_cell(column, new_row, cell);
            }
        }
        source.remove(row);
        Ok((dest, new_row))
    }

    fn find_or_create(&mut self, signature: Signature) -> Result<TableId> {
        if let Some(&id) = self.by_signature.get(&signature.key()) {
            return Ok(id);
        }
        // The top table id is reserved so packed records never collide
        // with the index sentinels.
        if self.tables.len() >= usize::from(u16::MAX) {
            return Err(Error::internal("table space exhausted"));
        }
        #[allow(clippy::cast_possible_truncation)]
        let id = TableId::from_raw(self.tables.len() as u16);
        self.by_signature.insert(signature.key(), id);
        self.tables.push(Table::new(id, signature));
        Ok(id)
    }

    /// Mutable access to two distinct tables at once.
    fn pair_mut(&mut self, a: TableId, b: TableId) -> (&mut Table, &mut Table) {
        debug_assert_ne!(a, b, "migration source and destination must differ");
        if a.index() < b.index() {
            let (left, right) = self.tables.split_at_mut(b.index());
            (&mut left[a.index()], &mut right[0])
        } else {
            let (left, right) = self.tables.split_at_mut(a.index());
            (&mut right[0], &mut left[b.index()])
        }
    }
}
