//! Tracking collections.
//!
//! A `TrackingCollection` is an ordered sequence of entities that, while
//! tracking is enabled, intercepts inserts and removals to drive the tracking
//! state machine over the affected subgraph, listens for property mutations
//! to promote entities to `Modified`, and caches removed entities so pending
//! deletions can be replayed during diff extraction.
//!
//! A collection with a non-null `parent` back-reference is the child side of
//! a many-to-many association: removing one of its items severs the
//! relationship without deleting the item itself.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use retrace_core::{is_reserved_property, TrackingState, VisitKey, VisitationTracker};

use crate::entity::EntityHandle;
use crate::error::{GraphError, GraphResult};
use crate::inspect::require_reference_tracker;
use crate::propagate::{apply_state, clear_modified, set_entity_tracking};

/// Callback fired when anything in the subgraph rooted at a collection
/// changes tracking state.
pub type ChangeListener = Rc<dyn Fn()>;

/// An observable, change-intercepting sequence of entities.
pub struct TrackingCollection {
    /// Live items, in insertion order.
    items: Vec<EntityHandle>,
    /// Whether mutations are currently intercepted.
    tracking: bool,
    /// Property names ignored when deciding `Modified` promotion.
    excluded_properties: Vec<String>,
    /// Owning entity of the child side of a many-to-many association.
    /// `None` for owned (one-to-many) collections.
    parent: Option<EntityHandle>,
    /// Entities removed while tracked, retained until accepted or cleared.
    cached_deletes: Vec<EntityHandle>,
    /// Coarse change-notification listeners.
    listeners: Vec<ChangeListener>,
}

/// Shared handle to a [`TrackingCollection`].
#[derive(Clone)]
pub struct CollectionHandle(Rc<RefCell<TrackingCollection>>);

impl CollectionHandle {
    /// Create an empty collection with tracking disabled.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TrackingCollection {
            items: Vec::new(),
            tracking: false,
            excluded_properties: Vec::new(),
            parent: None,
            cached_deletes: Vec::new(),
            listeners: Vec::new(),
        })))
    }

    /// Create an empty collection, optionally with tracking already on.
    pub fn with_tracking(enabled: bool) -> Self {
        let collection = Self::new();
        collection.set_tracking_flag(enabled);
        collection
    }

    /// Create a collection from existing entities. Items are added with
    /// interception suspended; tracking then begins if `tracking` is true.
    pub fn from_items(
        items: impl IntoIterator<Item = EntityHandle>,
        tracking: bool,
    ) -> GraphResult<Self> {
        let collection = Self::new();
        for item in items {
            collection.push_untracked(item);
        }
        if tracking {
            collection.set_tracking(true)?;
        }
        Ok(collection)
    }

    pub(crate) fn from_rc(inner: Rc<RefCell<TrackingCollection>>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<TrackingCollection>> {
        Rc::downgrade(&self.0)
    }

    /// Graph identity of this collection.
    pub fn key(&self) -> VisitKey {
        VisitKey::of(Rc::as_ptr(&self.0))
    }

    /// True if both handles point at the same collection allocation.
    pub fn same_collection(&self, other: &CollectionHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ---- sequence access ----

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    /// Item at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<EntityHandle> {
        self.0.borrow().items.get(index).cloned()
    }

    /// Snapshot of the live items.
    pub fn items(&self) -> Vec<EntityHandle> {
        self.0.borrow().items.clone()
    }

    /// True if the collection holds this exact entity.
    pub fn contains(&self, entity: &EntityHandle) -> bool {
        self.0.borrow().items.iter().any(|i| i.same_entity(entity))
    }

    /// Position of this exact entity, if present.
    pub fn index_of(&self, entity: &EntityHandle) -> Option<usize> {
        self.0.borrow().items.iter().position(|i| i.same_entity(entity))
    }

    // ---- configuration ----

    /// Whether mutations are currently intercepted.
    pub fn tracking(&self) -> bool {
        self.0.borrow().tracking
    }

    /// Owning entity, when this collection is a many-to-many child side.
    pub fn parent(&self) -> Option<EntityHandle> {
        self.0.borrow().parent.clone()
    }

    /// Mark (or unmark) this collection as the child side of a many-to-many
    /// association.
    pub fn set_parent(&self, parent: Option<EntityHandle>) {
        self.0.borrow_mut().parent = parent;
    }

    /// True for the child side of a many-to-many association.
    pub fn is_associative(&self) -> bool {
        self.0.borrow().parent.is_some()
    }

    /// Property names excluded from `Modified` promotion.
    pub fn excluded_properties(&self) -> Vec<String> {
        self.0.borrow().excluded_properties.clone()
    }

    /// Exclude a property name from `Modified` promotion.
    pub fn exclude_property(&self, name: &str) {
        let mut collection = self.0.borrow_mut();
        if !collection.excluded_properties.iter().any(|p| p == name) {
            collection.excluded_properties.push(name.to_string());
        }
    }

    // ---- tracking toggle ----

    /// Enable or disable change tracking over the whole reachable subgraph.
    pub fn set_tracking(&self, enabled: bool) -> GraphResult<()> {
        let listeners = self.listeners_snapshot();
        let mut tracker = VisitationTracker::new();
        self.set_tracking_guarded(enabled, &mut tracker, false, &listeners)
    }

    /// Cycle-guarded tracking toggle. With `one_to_many_only`, recursion is
    /// restricted to owned collection links: reference-link subgraphs and
    /// many-to-many child collections keep their current tracking state.
    pub fn set_tracking_guarded(
        &self,
        enabled: bool,
        tracker: &mut VisitationTracker,
        one_to_many_only: bool,
        listeners: &[ChangeListener],
    ) -> GraphResult<()> {
        if !tracker.try_visit(self.key()) {
            return Ok(());
        }
        for item in self.items() {
            if !tracker.try_visit(item.key()) {
                continue;
            }
            if enabled {
                item.subscribe(self);
            } else {
                item.unsubscribe(self);
            }
            set_entity_tracking(&item, enabled, tracker, one_to_many_only, listeners)?;
            if enabled {
                item.assign_identity();
            }
        }
        self.set_tracking_flag(enabled);
        Ok(())
    }

    /// Set the tracking flag without any graph traversal. This is the splice
    /// primitive diff extraction uses to restore and remove cached deletions
    /// without state side effects.
    pub fn set_tracking_flag(&self, enabled: bool) {
        self.0.borrow_mut().tracking = enabled;
    }

    // ---- change notification ----

    /// Subscribe a coarse change listener to this collection.
    pub fn subscribe_changed(&self, listener: ChangeListener) {
        let mut collection = self.0.borrow_mut();
        if !collection.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            collection.listeners.push(listener);
        }
    }

    /// Remove a previously subscribed change listener.
    pub fn unsubscribe_changed(&self, listener: &ChangeListener) {
        self.0
            .borrow_mut()
            .listeners
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    pub(crate) fn listeners_snapshot(&self) -> Vec<ChangeListener> {
        self.0.borrow().listeners.clone()
    }

    /// Attach (on enable) or detach (on disable) propagated listeners, so a
    /// change anywhere in the subgraph surfaces at the tracking root.
    pub(crate) fn attach_listeners(&self, enabled: bool, listeners: &[ChangeListener]) {
        let mut collection = self.0.borrow_mut();
        for listener in listeners {
            if enabled {
                if !collection.listeners.iter().any(|l| Rc::ptr_eq(l, listener)) {
                    collection.listeners.push(listener.clone());
                }
            } else {
                collection.listeners.retain(|l| !Rc::ptr_eq(l, listener));
            }
        }
    }

    pub(crate) fn raise_changed(&self) {
        let listeners = self.listeners_snapshot();
        for listener in listeners {
            listener();
        }
    }

    // ---- tracked mutation ----

    /// Append an entity.
    pub fn push(&self, entity: EntityHandle) -> GraphResult<()> {
        self.insert(self.len(), entity)
    }

    /// Insert an entity at `index`. While tracked: assigns an identity,
    /// subscribes to the entity's property mutations, enables tracking on
    /// the reachable subgraph, and applies `Added` through the state machine.
    pub fn insert(&self, index: usize, entity: EntityHandle) -> GraphResult<()> {
        let (tracking, parent, listeners, len) = {
            let collection = self.0.borrow();
            (
                collection.tracking,
                collection.parent.clone(),
                collection.listeners.clone(),
                collection.items.len(),
            )
        };
        if index > len {
            return Err(GraphError::IndexOutOfBounds { index, len });
        }

        if tracking {
            entity.assign_identity();
            entity.subscribe(self);

            // Exclude this collection and the association parent from the
            // recursive walks, so they cannot loop straight back up.
            let mut seeds = VisitationTracker::seeded(self.key());
            if let Some(parent) = &parent {
                seeds.try_visit(parent.key());
            }

            let mut tracker = seeds.clone();
            set_entity_tracking(&entity, true, &mut tracker, false, &listeners)?;

            let mut tracker = seeds.clone();
            apply_state(&entity, TrackingState::Added, &mut tracker, false)?;

            self.raise_changed();
        }

        self.0.borrow_mut().items.insert(index, entity);
        Ok(())
    }

    /// Remove the entity at `index`. While tracked: clears modified
    /// properties on the removed subgraph, unsubscribes, disables tracking
    /// restricted to owned collection links, applies `Deleted` through the
    /// state machine (with this collection's associativity), and caches the
    /// entity when the removal resolved to an actual deletion.
    pub fn remove(&self, index: usize) -> GraphResult<EntityHandle> {
        let (tracking, parent, listeners, item) = {
            let collection = self.0.borrow();
            let item = collection.items.get(index).cloned().ok_or({
                GraphError::IndexOutOfBounds {
                    index,
                    len: collection.items.len(),
                }
            })?;
            (
                collection.tracking,
                collection.parent.clone(),
                collection.listeners.clone(),
                item,
            )
        };

        if tracking {
            let mut seeds = VisitationTracker::seeded(self.key());
            if let Some(parent) = &parent {
                seeds.try_visit(parent.key());
            }

            item.set_modified_properties(None);
            let mut tracker = seeds.clone();
            clear_modified(&item, &mut tracker)?;

            item.unsubscribe(self);

            let mut tracker = seeds.clone();
            set_entity_tracking(&item, false, &mut tracker, true, &listeners)?;

            let mut tracker = seeds.clone();
            apply_state(&item, TrackingState::Deleted, &mut tracker, parent.is_some())?;

            self.raise_changed();

            // Cache exactly the removals that resolved to a deletion:
            // Added-then-removed cancels out, and severing a many-to-many
            // membership never deletes the member.
            if item.tracking_state() == TrackingState::Deleted && !self.is_cached(&item) {
                self.0.borrow_mut().cached_deletes.push(item.clone());
            }
        }

        // Listeners may have mutated the collection; locate by identity.
        let mut collection = self.0.borrow_mut();
        if let Some(position) = collection.items.iter().position(|i| i.same_entity(&item)) {
            collection.items.remove(position);
        }
        Ok(item)
    }

    /// Remove the given entity, if present. Returns whether it was found.
    pub fn remove_entity(&self, entity: &EntityHandle) -> GraphResult<bool> {
        match self.index_of(entity) {
            Some(index) => {
                self.remove(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---- untracked splice primitives ----

    /// Append without interception or state side effects.
    pub fn push_untracked(&self, entity: EntityHandle) {
        self.0.borrow_mut().items.push(entity);
    }

    /// Insert without interception or state side effects.
    pub fn insert_untracked(&self, index: usize, entity: EntityHandle) -> GraphResult<()> {
        let mut collection = self.0.borrow_mut();
        if index > collection.items.len() {
            return Err(GraphError::IndexOutOfBounds {
                index,
                len: collection.items.len(),
            });
        }
        collection.items.insert(index, entity);
        Ok(())
    }

    /// Remove without interception or state side effects.
    pub fn remove_untracked(&self, index: usize) -> GraphResult<EntityHandle> {
        let mut collection = self.0.borrow_mut();
        if index >= collection.items.len() {
            return Err(GraphError::IndexOutOfBounds {
                index,
                len: collection.items.len(),
            });
        }
        Ok(collection.items.remove(index))
    }

    // ---- cached deletions ----

    /// Entities removed while tracked, pending acceptance.
    pub fn cached_deletes(&self) -> Vec<EntityHandle> {
        self.0.borrow().cached_deletes.clone()
    }

    /// Discard all cached deletions.
    pub fn clear_cached_deletes(&self) {
        self.0.borrow_mut().cached_deletes.clear();
    }

    fn is_cached(&self, entity: &EntityHandle) -> bool {
        self.0
            .borrow()
            .cached_deletes
            .iter()
            .any(|d| d.same_entity(entity))
    }

    /// Shallow change query: current non-`Unchanged` items unioned with
    /// cached deletions, without walking the graph.
    pub fn changed_items(&self) -> Vec<EntityHandle> {
        let collection = self.0.borrow();
        let mut out: Vec<EntityHandle> = collection
            .items
            .iter()
            .filter(|i| i.tracking_state().is_changed())
            .cloned()
            .collect();
        for deleted in &collection.cached_deletes {
            if !out.iter().any(|i| i.same_entity(deleted)) {
                out.push(deleted.clone());
            }
        }
        out
    }

    // ---- property-mutation interception ----

    /// Handle a property-change notification from a subscribed entity.
    pub(crate) fn handle_property_changed(
        &self,
        entity: &EntityHandle,
        name: &str,
    ) -> GraphResult<()> {
        if !self.tracking() {
            return Ok(());
        }

        // A reference swap is structural: tracking for the swapped-in
        // subgraph is driven through the target's backing tracker, and the
        // entity itself is not marked Modified.
        if entity.has_reference_slot(name) {
            let tracker = require_reference_tracker(entity, name)?;
            tracker.set_tracking(self.tracking())?;
            return Ok(());
        }

        if is_reserved_property(name) {
            return Ok(());
        }
        if self.0.borrow().excluded_properties.iter().any(|p| p == name) {
            return Ok(());
        }

        if entity.tracking_state() == TrackingState::Unchanged {
            entity.set_tracking_state(TrackingState::Modified);
            self.raise_changed();
        }
        if matches!(
            entity.tracking_state(),
            TrackingState::Unchanged | TrackingState::Modified
        ) {
            entity.add_modified(name);
        }
        Ok(())
    }
}

impl Default for CollectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let collection = self.0.borrow();
        f.debug_struct("CollectionHandle")
            .field("len", &collection.items.len())
            .field("tracking", &collection.tracking)
            .field("associative", &collection.parent.is_some())
            .field("cached_deletes", &collection.cached_deletes.len())
            .finish()
    }
}
