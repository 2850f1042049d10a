//! Queries, deferred commands, and the step transaction for Trestle.
//!
//! This crate provides:
//! - [`Query`] - Compiled include/exclude predicates over signatures
//! - [`Command`] - Mutations buffered during a step
//! - [`StepScope`] - The transaction surface inside a step body
//! - [`Engine`] - The store owner and step orchestrator

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow large error types - our Error has rich context
#![allow(clippy::result_large_err)]

pub mod command;
pub mod engine;
pub mod query;
pub mod step;
mod world;

// Re-export primary types at crate root for convenience
pub use command::Command;
pub use engine::Engine;
pub use query::{select_entities, Clause, Query, QueryBuilder};
pub use step::StepScope;
