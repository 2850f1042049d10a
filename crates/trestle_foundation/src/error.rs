//! Error types for the Trestle system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::component::ComponentId;
use crate::entity::Entity;
use crate::value::ValueKind;

/// The main error type for Trestle operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an invalid-entity error.
    #[must_use]
    pub fn invalid_entity(entity: Entity) -> Self {
        Self::new(ErrorKind::InvalidEntity(entity))
    }

    /// Creates a missing-component error.
    #[must_use]
    pub fn missing_component(entity: Entity, component: ComponentId) -> Self {
        Self::new(ErrorKind::MissingComponent { entity, component })
    }

    /// Creates a duplicate-component error.
    #[must_use]
    pub fn duplicate_component(entity: Entity, component: ComponentId) -> Self {
        Self::new(ErrorKind::DuplicateComponent { entity, component })
    }

    /// Creates an empty-cell error.
    #[must_use]
    pub fn empty_cell(table: u16, row: u16, column: usize) -> Self {
        Self::new(ErrorKind::EmptyCell { table, row, column })
    }

    /// Creates a duplicate-signature-component error.
    #[must_use]
    pub fn duplicate_signature_component(component: ComponentId) -> Self {
        Self::new(ErrorKind::DuplicateSignatureComponent(component))
    }

    /// Creates a missing-signature-component error.
    #[must_use]
    pub fn missing_signature_component(component: ComponentId) -> Self {
        Self::new(ErrorKind::MissingSignatureComponent(component))
    }

    /// Creates a component-id-exhausted error.
    #[must_use]
    pub fn id_exhausted(min: u32, max: u32) -> Self {
        Self::new(ErrorKind::ComponentIdExhausted { min, max })
    }

    /// Creates a concurrent-step error.
    #[must_use]
    pub fn concurrent_step() -> Self {
        Self::new(ErrorKind::ConcurrentStep)
    }

    /// Creates a value-mismatch error.
    #[must_use]
    pub fn value_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        Self::new(ErrorKind::ValueMismatch { expected, actual })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Lookup, mutation, or destruction targeted an entity that was never
    /// allocated or has been destroyed.
    #[error("invalid entity: {0}")]
    InvalidEntity(Entity),

    /// Read or removal of a component not on the entity.
    #[error("missing component: {component} on {entity}")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// The component that was not found.
        component: ComponentId,
    },

    /// Addition of a component already on the entity.
    #[error("duplicate component: {component} already on {entity}")]
    DuplicateComponent {
        /// The entity that was targeted.
        entity: Entity,
        /// The component that was already present.
        component: ComponentId,
    },

    /// A table cell was read before it was written. This indicates an
    /// internal invariant violation and is not recoverable.
    #[error("empty cell: table {table} row {row} column {column}")]
    EmptyCell {
        /// Raw identifier of the table holding the cell.
        table: u16,
        /// Row of the cell.
        row: u16,
        /// Column position of the cell.
        column: usize,
    },

    /// `signature.with(c)` on a signature already containing `c`.
    #[error("{0} already present in signature")]
    DuplicateSignatureComponent(ComponentId),

    /// `signature.without(c)` on a signature not containing `c`.
    #[error("{0} absent from signature")]
    MissingSignatureComponent(ComponentId),

    /// A component-id allocator ran out of its assigned range.
    #[error("component id range [{min}, {max}] exhausted")]
    ComponentIdExhausted {
        /// Lower bound of the exhausted range.
        min: u32,
        /// Upper bound of the exhausted range.
        max: u32,
    },

    /// Reentrant or parallel step entry.
    #[error("a step is already in progress")]
    ConcurrentStep,

    /// A stored value had a different shape than the caller expected.
    #[error("value mismatch: expected {expected}, got {actual}")]
    ValueMismatch {
        /// The expected value shape.
        expected: ValueKind,
        /// The actual value shape encountered.
        actual: ValueKind,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The public operation that failed, e.g. `"add_component"`.
    pub operation: Option<String>,
    /// Free-form detail about the failure site.
    pub detail: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Adds free-form detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "in {operation}")?;
        }
        if let Some(detail) = &self.detail {
            if self.operation.is_some() {
                write!(f, ": ")?;
            }
            write!(f, "{detail}")?;
        }
        Ok(())
    }
}
