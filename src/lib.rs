//! Trestle - An archetype table store with transactional steps
//!
//! This crate re-exports all layers of the Trestle system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: trestle_engine     — Queries, deferred commands, step transactions
//! Layer 1: trestle_storage    — Signatures, entity index, archetype tables
//! Layer 0: trestle_foundation — Core ids, values, errors
//! ```

pub use trestle_engine as engine;
pub use trestle_foundation as foundation;
pub use trestle_storage as storage;
