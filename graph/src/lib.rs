//! Retrace Graph
//!
//! The live change-tracked entity graph.
//!
//! Responsibilities:
//! - Entity model: scalar attributes plus declared reference and collection
//!   navigation links, behind shared `Rc<RefCell<_>>` handles
//! - Tracking collections that intercept insert/remove and property
//!   mutations while tracking is enabled
//! - The tracking state machine and the cycle-guarded recursive walkers
//!   that propagate tracking flags and state transitions
//! - Navigation inspection: the capability contract for enumerating an
//!   entity's navigation links, with a default declared-slot inspector
//!
//! # Module Structure
//!
//! - `entity` - Entity storage and the `EntityHandle` surface
//! - `collection` - `TrackingCollection` and its interception logic
//! - `inspect` - `NavigationInspector` contract and companion lookups
//! - `propagate` - Recursive tracking/state propagation over the graph
//! - `error` - Error types for graph operations

mod collection;
mod entity;
mod error;
mod inspect;
mod propagate;

pub use collection::{ChangeListener, CollectionHandle, TrackingCollection};
pub use entity::{Entity, EntityHandle};
pub use error::{GraphError, GraphResult};
pub use inspect::{
    collection_for, navigation_entries, reference_tracker, require_reference_tracker,
    DeclaredNavigationInspector, NavigationEntry, NavigationInspector,
};
pub use propagate::{apply_state, clear_modified, set_entity_tracking};
