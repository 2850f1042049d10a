//! Core identifiers, values, and errors for Trestle.
//!
//! This crate provides:
//! - [`Entity`] - Monotonic, never-recycled entity identifiers
//! - [`ComponentId`] - Stable component type identifiers and their allocator
//! - [`Typed`] - Typed component handles over the untyped core
//! - [`Value`] - The shared component value type
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow large error types - our Error has rich context
#![allow(clippy::result_large_err)]

pub mod component;
pub mod entity;
pub mod error;
pub mod value;

// Re-export primary types at crate root for convenience
pub use component::{ComponentId, ComponentIdAllocator, Typed};
pub use entity::Entity;
pub use error::{Error, ErrorContext, ErrorKind};
pub use value::{Value, ValueKind};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
