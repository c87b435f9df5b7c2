//! Baseline acceptance.
//!
//! After a consumer has persisted a change-set, the live graph is rebased:
//! entities pending deletion in owned collections are physically removed,
//! every remaining reachable entity returns to `Unchanged` with its
//! modified-property set cleared, and every visited collection drops its
//! cached deletions.

use retrace_core::{TrackingState, VisitationTracker};
use retrace_graph::{navigation_entries, CollectionHandle, EntityHandle, GraphResult, NavigationEntry};

/// Rebase a whole root collection to an `Unchanged` baseline.
pub fn accept_changes(collection: &CollectionHandle) -> GraphResult<()> {
    let mut tracker = VisitationTracker::new();
    accept_collection(collection, &mut tracker)
}

/// Rebase a single entity's reachable subgraph to an `Unchanged` baseline.
pub fn accept_entity_changes(entity: &EntityHandle) -> GraphResult<()> {
    let mut tracker = VisitationTracker::new();
    accept_entity(entity, &mut tracker)
}

fn accept_collection(
    collection: &CollectionHandle,
    tracker: &mut VisitationTracker,
) -> GraphResult<()> {
    if !tracker.try_visit(collection.key()) {
        return Ok(());
    }
    let associative = collection.is_associative();
    for item in collection.items() {
        // A pending deletion in an owned collection is now final; the item
        // leaves the live sequence without state side effects. Associative
        // members are never deleted through their membership.
        if !associative && item.tracking_state() == TrackingState::Deleted {
            if let Some(index) = collection.index_of(&item) {
                collection.remove_untracked(index)?;
            }
            continue;
        }
        accept_entity(&item, tracker)?;
    }
    collection.clear_cached_deletes();
    Ok(())
}

fn accept_entity(entity: &EntityHandle, tracker: &mut VisitationTracker) -> GraphResult<()> {
    if !tracker.try_visit(entity.key()) {
        return Ok(());
    }
    for entry in navigation_entries(entity)? {
        match entry {
            NavigationEntry::Reference { target, .. } => {
                if let Some(target) = target {
                    accept_entity(&target, tracker)?;
                }
            }
            NavigationEntry::Collection { collection, .. } => {
                accept_collection(&collection, tracker)?;
            }
        }
    }
    entity.set_modified_properties(None);
    entity.set_tracking_state(TrackingState::Unchanged);
    Ok(())
}
