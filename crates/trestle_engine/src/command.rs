//! Deferred mutation commands.
//!
//! Every write issued inside a step becomes one of these commands, queued
//! on a multi-producer channel and applied in enqueue order once the step
//! body has returned. Strict FIFO matters: an add followed by a set of the
//! same component must land the set's value.

use trestle_foundation::{ComponentId, Entity, Value};

/// A mutation buffered during a step and applied at drain time.
#[derive(Clone, Debug)]
pub enum Command {
    /// Tombstone the entity and free its row. Applying this to an entity
    /// that is already destroyed is a no-op.
    DestroyEntity {
        /// Entity to destroy.
        entity: Entity,
    },
    /// Migrate the entity to the neighbouring archetype that carries
    /// `component`, writing `value` into the new column.
    AddComponent {
        /// Target entity.
        entity: Entity,
        /// Component to add.
        component: ComponentId,
        /// Initial value.
        value: Value,
    },
    /// Migrate the entity to the neighbouring archetype without
    /// `component`.
    RemoveComponent {
        /// Target entity.
        entity: Entity,
        /// Component to remove.
        component: ComponentId,
    },
    /// Overwrite the component's value in place, or degrade to
    /// [`Command::AddComponent`] if the entity does not carry it yet.
    SetComponent {
        /// Target entity.
        entity: Entity,
        /// Component to write.
        component: ComponentId,
        /// New value.
        value: Value,
    },
}
