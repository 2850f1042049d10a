//! Entity identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An opaque entity identifier.
///
/// Entities carry no data of their own; components attached through the
/// engine give them meaning. Identifiers are handed out monotonically and
/// never recycled: once an entity is destroyed its identifier stays dead
/// for the lifetime of the engine, so a handle can never silently start
/// referring to a different entity.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity(u32);

impl Entity {
    /// Creates an entity handle from a raw identifier.
    ///
    /// Handles built this way are only meaningful against the engine that
    /// allocated the identifier.
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}
