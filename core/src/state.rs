//! Per-entity change-tracking lifecycle.

use std::fmt;

/// Change-tracking state of an entity relative to the last accepted baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackingState {
    /// Entity matches the baseline.
    #[default]
    Unchanged,
    /// Entity was inserted into a tracked collection after the baseline.
    Added,
    /// At least one scalar property changed after the baseline.
    Modified,
    /// Entity was removed from an owned collection after the baseline.
    Deleted,
}

impl TrackingState {
    /// Returns true for any state other than `Unchanged`.
    pub fn is_changed(self) -> bool {
        self != TrackingState::Unchanged
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackingState::Unchanged => "Unchanged",
            TrackingState::Added => "Added",
            TrackingState::Modified => "Modified",
            TrackingState::Deleted => "Deleted",
        };
        write!(f, "{}", name)
    }
}
