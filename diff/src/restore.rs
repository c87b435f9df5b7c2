//! Temporary replay of cached deletions.
//!
//! Diff extraction needs deleted entities back in their owning collections
//! so the mark phase can see them; afterwards the live graph must return to
//! its exact pre-call shape. Both splices run with tracking suspended so no
//! state transitions or notifications fire, and both recurse over the whole
//! reachable graph under a visitation guard.
//!
//! The helpers are public: a collaborator that needs a temporarily complete
//! view of the graph, pending deletions included, can pair them the same way
//! extraction does.

use retrace_core::VisitationTracker;
use retrace_graph::{navigation_entries, CollectionHandle, EntityHandle, GraphResult, NavigationEntry};

/// Splice every cached deletion in the reachable graph back into its live
/// collection.
pub fn restore_deletes(collection: &CollectionHandle) -> GraphResult<()> {
    let mut tracker = VisitationTracker::new();
    restore_collection(collection, &mut tracker)
}

/// Remove every entity restored by [`restore_deletes`] from its live
/// collection again. Cached deletions stay cached.
pub fn remove_restored_deletes(collection: &CollectionHandle) -> GraphResult<()> {
    let mut tracker = VisitationTracker::new();
    unrestore_collection(collection, &mut tracker)
}

fn restore_collection(
    collection: &CollectionHandle,
    tracker: &mut VisitationTracker,
) -> GraphResult<()> {
    if !tracker.try_visit(collection.key()) {
        return Ok(());
    }
    let was_tracking = collection.tracking();
    collection.set_tracking_flag(false);
    for deleted in collection.cached_deletes() {
        if !collection.contains(&deleted) {
            collection.push_untracked(deleted);
        }
    }
    collection.set_tracking_flag(was_tracking);

    // Recurse over the post-restore view so deletions nested under a
    // deleted entity are replayed too.
    for item in collection.items() {
        restore_entity(&item, tracker)?;
    }
    Ok(())
}

fn restore_entity(entity: &EntityHandle, tracker: &mut VisitationTracker) -> GraphResult<()> {
    if !tracker.try_visit(entity.key()) {
        return Ok(());
    }
    for entry in navigation_entries(entity)? {
        match entry {
            NavigationEntry::Reference { target, .. } => {
                if let Some(target) = target {
                    restore_entity(&target, tracker)?;
                }
            }
            NavigationEntry::Collection { collection, .. } => {
                restore_collection(&collection, tracker)?;
            }
        }
    }
    Ok(())
}

fn unrestore_collection(
    collection: &CollectionHandle,
    tracker: &mut VisitationTracker,
) -> GraphResult<()> {
    if !tracker.try_visit(collection.key()) {
        return Ok(());
    }
    // Recurse before splicing this level, so nested collections are still
    // reachable through the restored entities.
    for item in collection.items() {
        unrestore_entity(&item, tracker)?;
    }

    let was_tracking = collection.tracking();
    collection.set_tracking_flag(false);
    for deleted in collection.cached_deletes() {
        if let Some(index) = collection.index_of(&deleted) {
            collection.remove_untracked(index)?;
        }
    }
    collection.set_tracking_flag(was_tracking);
    Ok(())
}

fn unrestore_entity(entity: &EntityHandle, tracker: &mut VisitationTracker) -> GraphResult<()> {
    if !tracker.try_visit(entity.key()) {
        return Ok(());
    }
    for entry in navigation_entries(entity)? {
        match entry {
            NavigationEntry::Reference { target, .. } => {
                if let Some(target) = target {
                    unrestore_entity(&target, tracker)?;
                }
            }
            NavigationEntry::Collection { collection, .. } => {
                unrestore_collection(&collection, tracker)?;
            }
        }
    }
    Ok(())
}
