//! Cycle guard for recursive graph walks.
//!
//! Entity graphs may contain reference cycles and diamond-shaped sharing, so
//! every recursive traversal carries a `VisitationTracker` recording which
//! nodes it has already processed. Identity is the address of the node's
//! shared allocation, never structural equality: two equal-looking entities
//! at different graph positions are distinct nodes.
//!
//! A tracker is scoped to one logical pass. Cloning a tracker inherits the
//! visited set, which lets a sub-call exclude ancestors the caller has
//! already handled (for example the collection an item was just removed
//! from) without sharing mutation with sibling sub-calls.

use std::collections::HashSet;

/// Identity key of a graph node: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisitKey(usize);

impl VisitKey {
    /// Key a node by the address of its backing allocation.
    pub fn of<T>(ptr: *const T) -> Self {
        Self(ptr as usize)
    }
}

/// Records the nodes a single traversal has already visited.
#[derive(Debug, Clone, Default)]
pub struct VisitationTracker {
    seen: HashSet<VisitKey>,
}

impl VisitationTracker {
    /// Empty tracker for a fresh traversal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker pre-seeded with one already-visited node.
    pub fn seeded(key: VisitKey) -> Self {
        let mut tracker = Self::new();
        tracker.seen.insert(key);
        tracker
    }

    /// Record the node as visited. Returns true on the first sighting,
    /// false (with no side effect) on a repeat.
    pub fn try_visit(&mut self, key: VisitKey) -> bool {
        self.seen.insert(key)
    }

    /// Pure check: has this node been visited in this traversal?
    pub fn is_visited(&self, key: VisitKey) -> bool {
        self.seen.contains(&key)
    }

    /// Number of distinct nodes visited so far.
    pub fn visited_count(&self) -> usize {
        self.seen.len()
    }
}
