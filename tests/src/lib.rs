//! Retrace Tests
//!
//! Shared fixtures for the integration test suite: small sales-domain
//! graph builders (customers, orders, order details, employee/territory
//! memberships) and a prelude pulling in the full public surface.


/// Everything an integration test needs.
pub mod prelude {
    pub use retrace_core::{attrs, EntityId, TrackingState, Value, VisitationTracker};
    pub use retrace_diff::{
        accept_changes, accept_entity_changes, clone_collection, clone_graph, extract_changes,
        extract_changes_with, remove_restored_deletes, restore_deletes, ChangeMarks, CloneMethod,
        CollectionDiffExt, GraphCloner,
    };
    pub use retrace_graph::{
        apply_state, clear_modified, collection_for, navigation_entries, reference_tracker,
        set_entity_tracking, ChangeListener, CollectionHandle, EntityHandle, GraphError,
        GraphResult, NavigationEntry,
    };

    pub use crate::fixtures::*;
}
