//! Recursive tracking and state propagation over entity graphs.
//!
//! These walkers follow an entity's navigation entries under a shared
//! [`VisitationTracker`], so arbitrary cycles terminate and diamond-shaped
//! graphs are processed once per node.

use retrace_core::{TrackingState, VisitationTracker};

use crate::collection::ChangeListener;
use crate::entity::EntityHandle;
use crate::error::GraphResult;
use crate::inspect::{navigation_entries, reference_tracker, NavigationEntry};

/// Enable or disable tracking across the subgraph reachable from `entity`.
///
/// With `one_to_many_only`, reference links and many-to-many child
/// collections are left at their current tracking state; only owned
/// collections are toggled. Removal uses this restricted walk so a removed
/// entity's reference-linked neighbours stay tracked.
pub fn set_entity_tracking(
    entity: &EntityHandle,
    enabled: bool,
    tracker: &mut VisitationTracker,
    one_to_many_only: bool,
    listeners: &[ChangeListener],
) -> GraphResult<()> {
    for entry in navigation_entries(entity)? {
        match entry {
            NavigationEntry::Reference { name, target } => {
                if one_to_many_only || target.is_none() {
                    continue;
                }
                if let Some(backing) = reference_tracker(entity, &name) {
                    backing.set_tracking_guarded(enabled, tracker, one_to_many_only, listeners)?;
                    backing.attach_listeners(enabled, listeners);
                }
            }
            NavigationEntry::Collection { collection, .. } => {
                if one_to_many_only && collection.is_associative() {
                    continue;
                }
                collection.set_tracking_guarded(enabled, tracker, one_to_many_only, listeners)?;
                collection.attach_listeners(enabled, listeners);
            }
        }
    }
    Ok(())
}

/// Apply a tracking state to `entity` and, through owned collections, to the
/// subgraph below it.
///
/// `Modified` never cascades. Reference links never cascade. Deletion of a
/// many-to-many member (`is_associative_item`) severs the membership without
/// deleting the member, unless the member carries live modifications; and
/// deleting an `Added` entity cancels out to `Unchanged`.
pub fn apply_state(
    entity: &EntityHandle,
    state: TrackingState,
    tracker: &mut VisitationTracker,
    is_associative_item: bool,
) -> GraphResult<()> {
    if !tracker.try_visit(entity.key()) {
        return Ok(());
    }

    if !is_associative_item && state != TrackingState::Modified {
        for entry in navigation_entries(entity)? {
            if let NavigationEntry::Collection { collection, .. } = entry {
                let associative = collection.is_associative();
                for item in collection.items() {
                    apply_state(&item, state, tracker, associative)?;
                }
            }
        }
    }

    if state == TrackingState::Deleted {
        if is_associative_item {
            // Severing a many-to-many membership keeps the member alive.
            if entity.tracking_state() != TrackingState::Modified {
                entity.set_tracking_state(TrackingState::Unchanged);
            }
            return Ok(());
        }
        if entity.tracking_state() == TrackingState::Added {
            // Deleting a pending addition cancels both out.
            entity.set_tracking_state(TrackingState::Unchanged);
            return Ok(());
        }
    }

    entity.set_tracking_state(state);
    Ok(())
}

/// Clear modified-property sets across the subgraph reachable through owned
/// collections.
pub fn clear_modified(entity: &EntityHandle, tracker: &mut VisitationTracker) -> GraphResult<()> {
    if !tracker.try_visit(entity.key()) {
        return Ok(());
    }
    for entry in navigation_entries(entity)? {
        if let NavigationEntry::Collection { collection, .. } = entry {
            for item in collection.items() {
                clear_modified(&item, tracker)?;
                item.set_modified_properties(None);
            }
        }
    }
    Ok(())
}
