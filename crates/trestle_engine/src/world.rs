//! The unified mutable store behind an engine: one entity index plus one
//! table index, with the read and mutation paths shared by the direct API
//! and the drain phase.

use tracing::trace;

use trestle_foundation::{ComponentId, Entity, Error, Result, Value};
use trestle_storage::{EntityIndex, Record, Slot, TableId, TableIndex};

use crate::command::Command;

pub(crate) struct World {
    entities: EntityIndex,
    tables: TableIndex,
}

impl World {
    pub(crate) fn new() -> Self {
        Self {
            entities: EntityIndex::new(),
            tables: TableIndex::new(),
        }
    }

    pub(crate) fn entities(&self) -> &EntityIndex {
        &self.entities
    }

    pub(crate) fn tables(&self) -> &TableIndex {
        &self.tables
    }

    // --- Reads ---

    pub(crate) fn exists(&self, entity: Entity) -> bool {
        self.entities.get(entity).is_some()
    }

    pub(crate) fn record_of(&self, entity: Entity) -> Result<Record> {
        self.entities
            .get(entity)
            .ok_or_else(|| Error::invalid_entity(entity))
    }

    pub(crate) fn has(&self, entity: Entity, component: ComponentId) -> Result<bool> {
        let record = self.record_of(entity)?;
        let table = self.table(record.table())?;
        Ok(table.signature().contains(component))
    }

    pub(crate) fn value_of(&self, entity: Entity, component: ComponentId) -> Result<Value> {
        let record = self.record_of(entity)?;
        let table = self.table(record.table())?;
        let column = table
            .signature()
            .index_of(component)
            .ok_or_else(|| Error::missing_component(entity, component))?;
        table
            .cell(column, record.row())
            .cloned()
            .ok_or_else(|| Error::empty_cell(record.table().raw(), record.row().raw(), column))
    }

    pub(crate) fn value_or_none(
        &self,
        entity: Entity,
        component: ComponentId,
    ) -> Result<Option<Value>> {
        let record = self.record_of(entity)?;
        let table = self.table(record.table())?;
        let Some(column) = table.signature().index_of(component) else {
            return Ok(None);
        };
        table
            .cell(column, record.row())
            .cloned()
            .map(Some)
            .ok_or_else(|| Error::empty_cell(record.table().raw(), record.row().raw(), column))
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    pub(crate) fn table_count(&self) -> usize {
        self.tables.len()
    }

    // --- Mutations ---

    /// Allocates a fresh entity and places it in the empty-signature table.
    pub(crate) fn spawn(&mut self) -> Result<Entity> {
        let entity = self.entities.alloc();
        let row = self.empty_table_mut()?.add(entity)?;
        self.entities
            .record(entity, Record::new(TableId::EMPTY, row))?;
        Ok(entity)
    }

    /// Promotes `count` drafted identifiers into live entities in the
    /// empty-signature table.
    pub(crate) fn commit_drafts(&mut self, count: u32) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let (first, last) = self.entities.alloc_batch(count);
        for id in first.id()..=last.id() {
            let entity = Entity::from_raw(id);
            let row = self.empty_table_mut()?.add(entity)?;
            self.entities
                .record_unchecked(entity, Record::new(TableId::EMPTY, row));
        }
        Ok(())
    }

    pub(crate) fn destroy(&mut self, entity: Entity) -> Result<()> {
        match self.entities.slot(entity) {
            None => Err(Error::invalid_entity(entity)),
            // Destruction is idempotent.
            Some(Slot::Removed) => Ok(()),
            Some(Slot::Unassigned) => Err(Error::internal(format!(
                "{entity} has no table assignment"
            ))),
            Some(Slot::Live(record)) => {
                self.table_mut(record.table())?.remove(record.row());
                self.entities.remove(entity)?;
                Ok(())
            }
        }
    }

    pub(crate) fn add(
        &mut self,
        entity: Entity,
        component: ComponentId,
        value: Value,
    ) -> Result<()> {
        let record = self.record_of(entity)?;
        if self.table(record.table())?.signature().contains(component) {
            return Err(Error::duplicate_component(entity, component));
        }
        let (table, row) =
            self.tables
                .migrate_with(record.table(), record.row(), component, value)?;
        self.entities.record(entity, Record::new(table, row))
    }

    pub(crate) fn remove(&mut self, entity: Entity, component: ComponentId) -> Result<()> {
        let record = self.record_of(entity)?;
        if !self.table(record.table())?.signature().contains(component) {
            return Err(Error::missing_component(entity, component));
        }
        let (table, row) = self
            .tables
            .migrate_without(record.table(), record.row(), component)?;
        self.entities.record(entity, Record::new(table, row))
    }

    pub(crate) fn set(
        &mut self,
        entity: Entity,
        component: ComponentId,
        value: Value,
    ) -> Result<()> {
        let record = self.record_of(entity)?;
        match self.table(record.table())?.signature().index_of(component) {
            Some(column) => {
                self.table_mut(record.table())?
                    .write_cell(column, record.row(), value);
                Ok(())
            }
            // Set on an absent component degrades to an add.
            None => self.add(entity, component, value),
        }
    }

    pub(crate) fn apply(&mut self, command: Command) -> Result<()> {
        trace!(?command, "applying deferred command");
        match command {
            Command::DestroyEntity { entity } => self.destroy(entity),
            Command::AddComponent {
                entity,
                component,
                value,
            } => self.add(entity, component, value),
            Command::RemoveComponent { entity, component } => self.remove(entity, component),
            Command::SetComponent {
                entity,
                component,
                value,
            } => self.set(entity, component, value),
        }
    }

    // --- Helpers ---

    fn table(&self, id: TableId) -> Result<&trestle_storage::Table> {
        self.tables
            .get_by_id(id)
            .ok_or_else(|| Error::internal(format!("record names unknown table {}", id.raw())))
    }

    fn table_mut(&mut self, id: TableId) -> Result<&mut trestle_storage::Table> {
        self.tables
            .get_mut(id)
            .ok_or_else(|| Error::internal(format!("record names unknown table {}", id.raw())))
    }

    fn empty_table_mut(&mut self) -> Result<&mut trestle_storage::Table> {
        self.table_mut(TableId::EMPTY)
    }
}
