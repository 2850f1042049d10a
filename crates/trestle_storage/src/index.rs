//! The entity index: a dense map from entity identifier to table location.
//!
//! Records pack `(table, row)` into 32 bits (16 + 16), which caps an engine
//! at 65 536 tables and each table at 65 536 rows but keeps the index at
//! four bytes per entity. Two raw values are reserved as sentinels for the
//! *unassigned* and *removed* states, so the identifier of the table at the
//! top of the id space never coexists with the top two rows; the table
//! registry stays below that boundary.

use std::fmt;

use trestle_foundation::{Entity, Error, Result};

/// Raw sentinel for an allocated identifier not yet placed in a table.
const UNASSIGNED: u32 = u32::MAX;
/// Raw sentinel for a destroyed identifier. Tombstones are permanent.
const REMOVED: u32 = u32::MAX - 1;

/// Identifier of an archetype table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TableId(u16);

impl TableId {
    /// The table of the empty signature, created with the engine.
    pub const EMPTY: TableId = TableId(0);

    /// Creates a table identifier from a raw value.
    #[must_use]
    pub const fn from_raw(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the identifier as a vector index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Row index within an archetype table.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RowId(u16);

impl RowId {
    /// Creates a row identifier from a raw value.
    #[must_use]
    pub const fn from_raw(row: u16) -> Self {
        Self(row)
    }

    /// Returns the raw row number.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the row as a column index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowId({})", self.0)
    }
}

/// A live entity's location: which table, which row.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Record {
    table: TableId,
    row: RowId,
}

impl Record {
    /// Creates a record from a table and row.
    #[must_use]
    pub const fn new(table: TableId, row: RowId) -> Self {
        Self { table, row }
    }

    /// Returns the table holding the entity.
    #[must_use]
    pub const fn table(self) -> TableId {
        self.table
    }

    /// Returns the entity's row within the table.
    #[must_use]
    pub const fn row(self) -> RowId {
        self.row
    }

    const fn pack(self) -> u32 {
        ((self.table.0 as u32) << 16) | (self.row.0 as u32)
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn unpack(raw: u32) -> Self {
        Self {
            table: TableId((raw >> 16) as u16),
            row: RowId(raw as u16),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({} @ {})", self.table.0, self.row.0)
    }
}

/// The state of one slot in the index.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Slot {
    /// Identifier allocated but not yet placed in a table.
    Unassigned,
    /// Identifier destroyed; tombstones never clear.
    Removed,
    /// Entity is live at the recorded location.
    Live(Record),
}

impl Slot {
    const fn decode(raw: u32) -> Self {
        match raw {
            UNASSIGNED => Self::Unassigned,
            REMOVED => Self::Removed,
            _ => Self::Live(Record::unpack(raw)),
        }
    }
}

/// Dense array of packed records, indexed directly by entity identifier.
///
/// Lookup is O(1) and allocation amortised O(1). The cursor behind
/// [`EntityIndex::draft`] is the length of the backing vector, so drafting
/// is idempotent between allocations.
#[derive(Debug, Default)]
pub struct EntityIndex {
    records: Vec<u32>,
    live: usize,
}

impl EntityIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier that [`EntityIndex::alloc`] would hand
    /// out, without advancing the cursor.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn draft(&self) -> Entity {
        Entity::from_raw(self.records.len() as u32)
    }

    /// Returns the number of identifiers allocated so far.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_id(&self) -> u32 {
        self.records.len() as u32
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Allocates a fresh identifier in the *unassigned* state.
    ///
    /// A new entity cannot know its `(table, row)` before a table chooses a
    /// row, so the slot starts unassigned and is recorded later.
    pub fn alloc(&mut self) -> Entity {
        let entity = self.draft();
        self.records.push(UNASSIGNED);
        entity
    }

    /// Reserves a contiguous block of `n` identifiers, all unassigned.
    ///
    /// Returns the first and last identifier of the block, inclusive.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn alloc_batch(&mut self, n: u32) -> (Entity, Entity) {
        assert!(n > 0, "alloc_batch of zero entities");
        let first = self.draft();
        self.records
            .extend(std::iter::repeat(UNASSIGNED).take(n as usize));
        (first, Entity::from_raw(first.id() + n - 1))
    }

    /// Writes a live record for `entity`.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] if the
    /// identifier was never allocated or has been destroyed.
    pub fn record(&mut self, entity: Entity, record: Record) -> Result<()> {
        let slot = self
            .records
            .get_mut(entity.id() as usize)
            .ok_or_else(|| Error::invalid_entity(entity))?;
        if *slot == REMOVED {
            return Err(Error::invalid_entity(entity));
        }
        if *slot == UNASSIGNED {
            self.live += 1;
        }
        *slot = record.pack();
        Ok(())
    }

    /// Writes a live record without the tombstone check.
    ///
    /// Used during batch commit, where every identifier in the batch is
    /// known to be freshly allocated.
    pub fn record_unchecked(&mut self, entity: Entity, record: Record) {
        let slot = &mut self.records[entity.id() as usize];
        if *slot == UNASSIGNED {
            self.live += 1;
        }
        *slot = record.pack();
    }

    /// Returns the record of a live entity, or `None` for identifiers that
    /// are out of range, unassigned, or removed.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<Record> {
        match self.slot(entity)? {
            Slot::Live(record) => Some(record),
            Slot::Unassigned | Slot::Removed => None,
        }
    }

    /// Returns the raw slot state, or `None` if the identifier is out of
    /// range.
    #[must_use]
    pub fn slot(&self, entity: Entity) -> Option<Slot> {
        self.records
            .get(entity.id() as usize)
            .map(|&raw| Slot::decode(raw))
    }

    /// Tombstones `entity` and returns the slot's prior state, which may
    /// already be [`Slot::Removed`].
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] if the
    /// identifier was never allocated.
    pub fn remove(&mut self, entity: Entity) -> Result<Slot> {
        let slot = self
            .records
            .get_mut(entity.id() as usize)
            .ok_or_else(|| Error::invalid_entity(entity))?;
        let previous = Slot::decode(*slot);
        if matches!(previous, Slot::Live(_)) {
            self.live -= 1;
        }
        *slot = REMOVED;
        Ok(previous)
    }
}
