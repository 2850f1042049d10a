//! Signatures, the entity index, and archetype tables for Trestle.
//!
//! This crate provides:
//! - [`Signature`] - Sorted component-id sets keying archetypes
//! - [`EntityIndex`] - Dense entity-to-location records
//! - [`Table`] - Column-major storage for one archetype
//! - [`TableIndex`] - The table registry and archetype graph

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow large error types - our Error has rich context
#![allow(clippy::result_large_err)]

pub mod index;
pub mod signature;
pub mod table;
pub mod tables;

// Re-export primary types at crate root for convenience
pub use index::{EntityIndex, Record, RowId, Slot, TableId};
pub use signature::{Signature, SignatureKey};
pub use table::{Rows, Table};
pub use tables::TableIndex;
