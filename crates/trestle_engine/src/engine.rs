//! The engine: owner of the store and orchestrator of step transactions.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::debug;

use trestle_foundation::{ComponentId, Entity, Error, ErrorContext, Result, Value};
use trestle_storage::TableIndex;

use crate::step::{BusyGuard, StepScope};
use crate::world::World;

/// An entity-component store with transactional steps.
///
/// At most one step runs at a time across the whole process; inside a step
/// any number of threads may read and enqueue writes through the
/// [`StepScope`]. Between steps the direct methods below mutate
/// immediately. Direct mutation while a step is active fails with
/// [`trestle_foundation::ErrorKind::ConcurrentStep`] rather than blocking:
/// letting it through would break the step's stable-read guarantee, and
/// blocking would deadlock a body thread that strayed onto the direct
/// surface.
pub struct Engine {
    state: RwLock<World>,
    busy: AtomicBool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine holding only the empty-signature table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(World::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Runs `body` as a step transaction.
    ///
    /// Drafted entities are committed and queued commands applied, in
    /// enqueue order, after `body` returns. If the body unwinds, the drain
    /// phase is skipped and the engine is released for the next step.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::ConcurrentStep`] if a
    /// step is already in progress, or with the first error raised while
    /// applying the queued commands.
    pub fn step<R>(&self, body: impl FnOnce(&StepScope<'_>) -> R) -> Result<R> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        // The upgradable read admits concurrent readers during the body
        // but guarantees no writer lands between the snapshot and the
        // drain — the drafted identifiers handed out by the scope must be
        // exactly the identifiers the commit batch allocates.
        let state = self.state.upgradable_read();
        let (scope, receiver) = StepScope::new(&state);
        debug!(first_draft = scope.first_draft(), "step begin");

        let result = body(&scope);

        let drafted = scope.drafted();
        drop(scope);

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.commit_drafts(drafted)?;
        let mut applied = 0usize;
        for command in receiver.try_iter() {
            state.apply(command)?;
            applied += 1;
        }
        debug!(drafted, applied, "step committed");
        Ok(result)
    }

    // --- Direct entity management (between steps) ---

    /// Allocates a live entity with the empty archetype.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::ConcurrentStep`] while
    /// a step is active.
    pub fn new_entity(&self) -> Result<Entity> {
        self.guard_mutation("new_entity")?;
        self.state.write().spawn()
    }

    /// Destroys an entity. Idempotent: destroying an entity that is
    /// already destroyed succeeds.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] for an
    /// identifier that was never allocated, or
    /// [`trestle_foundation::ErrorKind::ConcurrentStep`] while a step is
    /// active.
    pub fn destroy_entity(&self, entity: Entity) -> Result<()> {
        self.guard_mutation("destroy_entity")?;
        self.state.write().destroy(entity)
    }

    /// Returns true if the entity is live.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.state.read_recursive().exists(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.state.read_recursive().entity_count()
    }

    /// Returns the number of archetype tables, the empty table included.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.state.read_recursive().table_count()
    }

    /// Runs `f` against the table registry. Diagnostics surface: lets
    /// callers inspect archetype layout, row occupancy, and graph edges
    /// without holding a borrow across the call.
    pub fn inspect_tables<R>(&self, f: impl FnOnce(&TableIndex) -> R) -> R {
        f(self.state.read_recursive().tables())
    }

    // --- Direct component management (between steps) ---

    /// Adds a component to an entity, migrating it one edge along the
    /// archetype graph.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`],
    /// [`trestle_foundation::ErrorKind::DuplicateComponent`], or
    /// [`trestle_foundation::ErrorKind::ConcurrentStep`].
    pub fn add_component(
        &self,
        entity: Entity,
        component: ComponentId,
        value: Value,
    ) -> Result<()> {
        self.guard_mutation("add_component")?;
        self.state.write().add(entity, component, value)
    }

    /// Removes a component from an entity.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`],
    /// [`trestle_foundation::ErrorKind::MissingComponent`], or
    /// [`trestle_foundation::ErrorKind::ConcurrentStep`].
    pub fn remove_component(&self, entity: Entity, component: ComponentId) -> Result<()> {
        self.guard_mutation("remove_component")?;
        self.state.write().remove(entity, component)
    }

    /// Writes a component value, adding the component if absent.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] or
    /// [`trestle_foundation::ErrorKind::ConcurrentStep`].
    pub fn set_component(
        &self,
        entity: Entity,
        component: ComponentId,
        value: Value,
    ) -> Result<()> {
        self.guard_mutation("set_component")?;
        self.state.write().set(entity, component, value)
    }

    /// Reads a component value.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] or
    /// [`trestle_foundation::ErrorKind::MissingComponent`].
    pub fn get_component(&self, entity: Entity, component: ComponentId) -> Result<Value> {
        self.state.read_recursive().value_of(entity, component)
    }

    /// Reads a component value, `None` if the entity does not carry it.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`].
    pub fn get_component_or_none(
        &self,
        entity: Entity,
        component: ComponentId,
    ) -> Result<Option<Value>> {
        self.state.read_recursive().value_or_none(entity, component)
    }

    /// Returns whether the entity carries the component.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`].
    pub fn has_component(&self, entity: Entity, component: ComponentId) -> Result<bool> {
        self.state.read_recursive().has(entity, component)
    }

    fn guard_mutation(&self, operation: &str) -> Result<()> {
        if self.busy.load(Ordering::Acquire) {
            return Err(Error::concurrent_step()
                .with_context(ErrorContext::new().with_operation(operation)));
        }
        Ok(())
    }
}
