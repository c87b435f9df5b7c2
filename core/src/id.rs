//! Correlation identifiers for tracked entities.
//!
//! An `EntityId` is assigned lazily, the first time an entity becomes
//! tracked, and stays stable for the entity's lifetime. It exists only to
//! correlate clones of the same logical entity across graphs (for example
//! merging a saved diff back into the live graph); it is never used to
//! compare untracked entities.

use std::fmt;
use uuid::Uuid;

/// Stable correlation token for a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing identifier value.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying identifier value.
    pub fn raw(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
