//! Tracked entity storage.
//!
//! An entity is a mutable graph node: scalar attributes, declared reference
//! navigation links (0..1 related entity each) and declared collection
//! navigation links (0..n related entities, each backed by its own
//! [`TrackingCollection`](crate::TrackingCollection)). Entities are shared
//! through cheap [`EntityHandle`] clones; graph identity is the handle's
//! allocation address, never the entity's contents.
//!
//! Every declared reference link owns a backing tracker: a tracking
//! collection holding the current target. A reference swap is a structural
//! event, so tracking for the swapped-in subgraph is driven through that
//! backing tracker rather than through the reference slot itself.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use retrace_core::{Attributes, EntityId, TrackingState, Value, VisitKey};

use crate::collection::{CollectionHandle, TrackingCollection};
use crate::error::{GraphError, GraphResult};
use crate::inspect::NavigationInspector;

/// A declared reference navigation slot.
struct ReferenceSlot {
    /// Current target, if set.
    target: Option<EntityHandle>,
    /// Backing tracker owning the target's tracking lifecycle.
    tracker: CollectionHandle,
}

/// A mutable node in a tracked object graph.
pub struct Entity {
    /// Correlation identifier, assigned the first time the entity is tracked.
    identity: Option<EntityId>,
    /// Change-tracking state relative to the last accepted baseline.
    state: TrackingState,
    /// Names of scalar properties changed since the baseline.
    /// Only meaningful while `state` is `Modified`.
    modified: Option<HashSet<String>>,
    /// Scalar property values.
    attributes: Attributes,
    /// Declared reference navigation slots, by property name.
    references: BTreeMap<String, ReferenceSlot>,
    /// Declared collection navigation slots, by property name.
    collections: BTreeMap<String, CollectionHandle>,
    /// Custom navigation inspector, if the entity supplies one.
    inspector: Option<Rc<dyn NavigationInspector>>,
    /// Collections listening for this entity's property mutations.
    subscribers: Vec<Weak<RefCell<TrackingCollection>>>,
}

/// Shared handle to an [`Entity`].
#[derive(Clone)]
pub struct EntityHandle(Rc<RefCell<Entity>>);

impl EntityHandle {
    /// Create an entity with no attributes, state `Unchanged`, untracked.
    pub fn new() -> Self {
        Self::with_attributes(Attributes::new())
    }

    /// Create an entity holding the given scalar attributes.
    pub fn with_attributes(attributes: Attributes) -> Self {
        Self(Rc::new(RefCell::new(Entity {
            identity: None,
            state: TrackingState::Unchanged,
            modified: None,
            attributes,
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
            inspector: None,
            subscribers: Vec::new(),
        })))
    }

    /// Graph identity of this entity: the address of its shared allocation.
    pub fn key(&self) -> VisitKey {
        VisitKey::of(Rc::as_ptr(&self.0))
    }

    /// True if both handles point at the same entity allocation.
    pub fn same_entity(&self, other: &EntityHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ---- tracking metadata ----

    /// Current change-tracking state.
    pub fn tracking_state(&self) -> TrackingState {
        self.0.borrow().state
    }

    /// Assign the state directly, without recursion or notification.
    /// State-machine resolution lives in [`apply_state`](crate::apply_state).
    pub fn set_tracking_state(&self, state: TrackingState) {
        self.0.borrow_mut().state = state;
    }

    /// Snapshot of the modified-property set, if any.
    pub fn modified_properties(&self) -> Option<HashSet<String>> {
        self.0.borrow().modified.clone()
    }

    /// Replace the modified-property set.
    pub fn set_modified_properties(&self, modified: Option<HashSet<String>>) {
        self.0.borrow_mut().modified = modified;
    }

    /// Record a property name as modified since the baseline.
    pub(crate) fn add_modified(&self, name: &str) {
        let mut entity = self.0.borrow_mut();
        entity
            .modified
            .get_or_insert_with(HashSet::new)
            .insert(name.to_string());
    }

    // ---- identity ----

    /// Correlation identifier, if one has been assigned.
    pub fn identity(&self) -> Option<EntityId> {
        self.0.borrow().identity
    }

    /// Assign a correlation identifier if absent; returns the current one.
    pub fn assign_identity(&self) -> EntityId {
        let mut entity = self.0.borrow_mut();
        *entity.identity.get_or_insert_with(EntityId::generate)
    }

    /// Copy the correlation identifier (or its absence) from another entity.
    pub fn copy_identity_from(&self, other: &EntityHandle) {
        let identity = other.identity();
        self.0.borrow_mut().identity = identity;
    }

    /// Identity-based equivalence. False while either side is unassigned:
    /// untracked entities are never correlated.
    pub fn has_same_identity(&self, other: &EntityHandle) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    // ---- scalar attributes ----

    /// Get a scalar attribute value by name.
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.0.borrow().attributes.get(name).cloned()
    }

    /// Snapshot of all scalar attributes.
    pub fn attributes(&self) -> Attributes {
        self.0.borrow().attributes.clone()
    }

    /// Set a scalar attribute and notify subscribed collections.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> GraphResult<()> {
        {
            let mut entity = self.0.borrow_mut();
            if entity.references.contains_key(name) || entity.collections.contains_key(name) {
                return Err(GraphError::NavigationPropertyWrite {
                    name: name.to_string(),
                });
            }
            entity.attributes.insert(name.to_string(), value.into());
        }
        self.notify_property_changed(name)
    }

    // ---- reference navigation ----

    /// Declare a reference navigation slot with no target.
    pub fn declare_reference(&self, name: &str) -> GraphResult<()> {
        let mut entity = self.0.borrow_mut();
        if entity.references.contains_key(name) || entity.collections.contains_key(name) {
            return Err(GraphError::DuplicateNavigationProperty {
                name: name.to_string(),
            });
        }
        entity.references.insert(
            name.to_string(),
            ReferenceSlot {
                target: None,
                tracker: CollectionHandle::new(),
            },
        );
        Ok(())
    }

    /// Current target of a declared reference slot.
    pub fn reference(&self, name: &str) -> Option<EntityHandle> {
        self.0
            .borrow()
            .references
            .get(name)
            .and_then(|slot| slot.target.clone())
    }

    /// True if `name` is a declared reference navigation property.
    pub fn has_reference_slot(&self, name: &str) -> bool {
        self.0.borrow().references.contains_key(name)
    }

    /// Names of all declared reference slots.
    pub fn reference_names(&self) -> Vec<String> {
        self.0.borrow().references.keys().cloned().collect()
    }

    /// Backing tracker of a declared reference slot.
    pub fn reference_tracker(&self, name: &str) -> Option<CollectionHandle> {
        self.0
            .borrow()
            .references
            .get(name)
            .map(|slot| slot.tracker.clone())
    }

    /// Point a declared reference slot at a new target (or clear it), rebuild
    /// the backing tracker around the target, and notify subscribers. The
    /// notification lets an observing collection enable tracking on the
    /// swapped-in subgraph through the backing tracker.
    pub fn set_reference(&self, name: &str, target: Option<EntityHandle>) -> GraphResult<()> {
        {
            let mut entity = self.0.borrow_mut();
            let slot = entity.references.get_mut(name).ok_or_else(|| {
                GraphError::UnknownNavigationProperty {
                    name: name.to_string(),
                }
            })?;
            let tracker = CollectionHandle::new();
            if let Some(target) = &target {
                tracker.push_untracked(target.clone());
            }
            slot.target = target;
            slot.tracker = tracker;
        }
        self.notify_property_changed(name)
    }

    // ---- collection navigation ----

    /// Declare a collection navigation slot backed by a fresh, untracked
    /// collection, and return its handle.
    pub fn declare_collection(&self, name: &str) -> GraphResult<CollectionHandle> {
        let collection = CollectionHandle::new();
        self.attach_collection(name, collection.clone())?;
        Ok(collection)
    }

    /// Attach an existing collection as a navigation slot.
    pub fn attach_collection(&self, name: &str, collection: CollectionHandle) -> GraphResult<()> {
        let mut entity = self.0.borrow_mut();
        if entity.references.contains_key(name) || entity.collections.contains_key(name) {
            return Err(GraphError::DuplicateNavigationProperty {
                name: name.to_string(),
            });
        }
        entity.collections.insert(name.to_string(), collection);
        Ok(())
    }

    /// Collection navigation slot by name.
    pub fn collection(&self, name: &str) -> Option<CollectionHandle> {
        self.0.borrow().collections.get(name).cloned()
    }

    /// Names of all declared collection slots.
    pub fn collection_names(&self) -> Vec<String> {
        self.0.borrow().collections.keys().cloned().collect()
    }

    // ---- navigation inspection ----

    /// Install a custom navigation inspector for this entity.
    pub fn set_inspector(&self, inspector: Rc<dyn NavigationInspector>) {
        self.0.borrow_mut().inspector = Some(inspector);
    }

    /// The entity's custom inspector, if one is installed.
    pub fn inspector(&self) -> Option<Rc<dyn NavigationInspector>> {
        self.0.borrow().inspector.clone()
    }

    // ---- property-change subscription ----

    /// Subscribe a collection to this entity's property mutations.
    pub(crate) fn subscribe(&self, collection: &CollectionHandle) {
        let weak = collection.downgrade();
        let mut entity = self.0.borrow_mut();
        if !entity.subscribers.iter().any(|s| s.ptr_eq(&weak)) {
            entity.subscribers.push(weak);
        }
    }

    /// Remove a collection's subscription.
    pub(crate) fn unsubscribe(&self, collection: &CollectionHandle) {
        let weak = collection.downgrade();
        self.0.borrow_mut().subscribers.retain(|s| !s.ptr_eq(&weak));
    }

    /// Fire a property-change notification to every subscribed collection.
    ///
    /// Normally invoked by `set_attr`/`set_reference`; public so entities
    /// with out-of-band mutation paths can participate in tracking.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty: a notification without a property name is
    /// a programming error, not a recoverable condition.
    pub fn notify_property_changed(&self, name: &str) -> GraphResult<()> {
        assert!(
            !name.is_empty(),
            "property change notification without a property name"
        );
        let subscribers: Vec<Rc<RefCell<TrackingCollection>>> = {
            let mut entity = self.0.borrow_mut();
            entity.subscribers.retain(|s| s.strong_count() > 0);
            entity.subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for subscriber in subscribers {
            CollectionHandle::from_rc(subscriber).handle_property_changed(self, name)?;
        }
        Ok(())
    }
}

impl Default for EntityHandle {
    fn default() -> Self {
        Self::new()
    }
}

// Manual Debug: the graph may be cyclic, so printing must not recurse into
// navigation links.
impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = self.0.borrow();
        f.debug_struct("EntityHandle")
            .field("state", &entity.state)
            .field("identity", &entity.identity)
            .field("attributes", &entity.attributes.len())
            .field("references", &entity.references.len())
            .field("collections", &entity.collections.len())
            .finish()
    }
}
