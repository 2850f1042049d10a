//! The step scope: the surface handed to a step body.
//!
//! Reads go straight to the pre-step snapshot; writes become deferred
//! commands on a multi-producer queue. The scope is `Sync`, so a body may
//! share it across the threads of a supervised scope — every thread reads
//! the same snapshot and enqueues into the same queue.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam_channel::{Receiver, Sender};

use trestle_foundation::{ComponentId, Entity, Error, Result, Value};

use crate::command::Command;
use crate::query::Query;
use crate::world::World;

/// Scoped acquisition of the engine's busy flag.
///
/// The flag is released on drop, so every exit path out of a step —
/// including an unwinding body — leaves the engine ready for the next
/// step.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(Error::concurrent_step());
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The transaction surface available inside a step body.
///
/// Mutations are deferred: they apply after the body returns, in the order
/// they were enqueued. Reads observe the pre-step snapshot, so a value read
/// twice within one step is the same value regardless of enqueued writes —
/// and an entity drafted in this step is not yet readable.
pub struct StepScope<'a> {
    world: &'a World,
    queue: Sender<Command>,
    first_draft: u32,
    drafted: AtomicU32,
}

impl<'a> StepScope<'a> {
    pub(crate) fn new(world: &'a World) -> (Self, Receiver<Command>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let scope = Self {
            world,
            queue: sender,
            first_draft: world.entities().draft().id(),
            drafted: AtomicU32::new(0),
        };
        (scope, receiver)
    }

    pub(crate) fn first_draft(&self) -> u32 {
        self.first_draft
    }

    pub(crate) fn drafted(&self) -> u32 {
        self.drafted.load(Ordering::Acquire)
    }

    fn enqueue(&self, command: Command) {
        // The receiver outlives every scope borrow; it is drained after
        // the body returns.
        let _ = self.queue.send(command);
    }

    // --- Deferred mutations ---

    /// Drafts a fresh entity.
    ///
    /// The identifier is reserved immediately, but the entity is only
    /// placed in a table when the step commits; until then it does not
    /// exist for reads, and components queued onto it land after commit.
    pub fn new_entity(&self) -> Entity {
        let offset = self.drafted.fetch_add(1, Ordering::AcqRel);
        Entity::from_raw(self.first_draft + offset)
    }

    /// Queues destruction of `entity`. Destroying an entity twice is not
    /// an error.
    pub fn destroy_entity(&self, entity: Entity) {
        self.enqueue(Command::DestroyEntity { entity });
    }

    /// Queues addition of `component` with `value`.
    pub fn add_component(&self, entity: Entity, component: ComponentId, value: Value) {
        self.enqueue(Command::AddComponent {
            entity,
            component,
            value,
        });
    }

    /// Queues removal of `component`.
    pub fn remove_component(&self, entity: Entity, component: ComponentId) {
        self.enqueue(Command::RemoveComponent { entity, component });
    }

    /// Queues a write of `component`, adding it if absent.
    pub fn set_component(&self, entity: Entity, component: ComponentId, value: Value) {
        self.enqueue(Command::SetComponent {
            entity,
            component,
            value,
        });
    }

    // --- Snapshot reads ---

    /// Returns true if `entity` was live when the step began.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.world.exists(entity)
    }

    /// Returns whether the entity carried the component at step begin.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] if the
    /// entity is not live in the snapshot.
    pub fn has_component(&self, entity: Entity, component: ComponentId) -> Result<bool> {
        self.world.has(entity, component)
    }

    /// Reads a component value from the snapshot.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] or
    /// [`trestle_foundation::ErrorKind::MissingComponent`].
    pub fn get_component(&self, entity: Entity, component: ComponentId) -> Result<Value> {
        self.world.value_of(entity, component)
    }

    /// Reads a component value from the snapshot, `None` if absent.
    ///
    /// # Errors
    ///
    /// Fails with [`trestle_foundation::ErrorKind::InvalidEntity`] if the
    /// entity is not live in the snapshot.
    pub fn get_component_or_none(
        &self,
        entity: Entity,
        component: ComponentId,
    ) -> Result<Option<Value>> {
        self.world.value_or_none(entity, component)
    }

    // --- Snapshot iteration ---

    /// Calls `f` for every entity whose archetype matches `query`.
    ///
    /// Iteration covers the pre-step snapshot; entities drafted or
    /// destroyed in this step are not reflected.
    pub fn for_each(&self, query: &Query, mut f: impl FnMut(Entity)) {
        for table in self.world.tables().iter() {
            if query.matches(table.signature()) {
                for (_, entity) in table.rows() {
                    f(entity);
                }
            }
        }
    }

    /// Collects every entity whose archetype matches `query`.
    #[must_use]
    pub fn entities_matching(&self, query: &Query) -> Vec<Entity> {
        let mut entities = Vec::new();
        self.for_each(query, |entity| entities.push(entity));
        entities
    }
}
