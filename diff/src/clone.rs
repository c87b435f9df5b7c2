//! Guided deep copies of entity graphs.
//!
//! The cloner produces structurally independent copies: new entity and
//! collection allocations, attribute snapshots, copied tracking state,
//! modified-property sets and identities. Cloned collections are untracked
//! and carry no cached deletions. When guided by [`ChangeMarks`], omitted
//! reference links become unset and excluded collection items are dropped;
//! without marks the whole reachable graph is copied.

use std::collections::HashMap;

use retrace_core::VisitKey;
use retrace_graph::{CollectionHandle, EntityHandle, GraphResult};

use crate::mark::ChangeMarks;

/// How shared references inside one cloning pass are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneMethod {
    /// Field-by-field copy. Two links to the same entity produce two
    /// independent copies; only links back into the active path are reused,
    /// so cycles still terminate.
    Memberwise,
    /// Identity-preserving copy. Every source entity maps to exactly one
    /// clone for the whole pass, so aliasing survives into the copy.
    ReferencePreserving,
}

/// A single cloning pass over a graph.
pub struct GraphCloner<'a> {
    method: CloneMethod,
    marks: Option<&'a ChangeMarks>,
    /// Source key to clone. Under `Memberwise` entries live only while their
    /// source is on the active path; under `ReferencePreserving` they persist
    /// for the whole pass.
    mapped: HashMap<VisitKey, EntityHandle>,
}

impl<'a> GraphCloner<'a> {
    /// Cloner that copies everything reachable.
    pub fn new(method: CloneMethod) -> Self {
        Self {
            method,
            marks: None,
            mapped: HashMap::new(),
        }
    }

    /// Cloner that prunes the copy according to recorded inclusion marks.
    pub fn with_marks(method: CloneMethod, marks: &'a ChangeMarks) -> Self {
        Self {
            method,
            marks: Some(marks),
            mapped: HashMap::new(),
        }
    }

    /// Deep-copy one entity and its (marked) reachable subgraph.
    pub fn clone_entity(&mut self, source: &EntityHandle) -> GraphResult<EntityHandle> {
        let key = source.key();
        if let Some(existing) = self.mapped.get(&key) {
            return Ok(existing.clone());
        }

        let clone = EntityHandle::with_attributes(source.attributes());
        clone.set_tracking_state(source.tracking_state());
        clone.set_modified_properties(source.modified_properties());
        clone.copy_identity_from(source);
        if let Some(inspector) = source.inspector() {
            clone.set_inspector(inspector);
        }

        // Register before recursing so links back into the active path
        // resolve to the clone under construction.
        self.mapped.insert(key, clone.clone());

        for name in source.reference_names() {
            clone.declare_reference(&name)?;
            let omitted = self
                .marks
                .is_some_and(|m| m.is_reference_omitted(key, &name));
            if omitted {
                continue;
            }
            if let Some(target) = source.reference(&name) {
                let target_clone = self.clone_entity(&target)?;
                clone.set_reference(&name, Some(target_clone))?;
            }
        }

        for name in source.collection_names() {
            let source_collection = source
                .collection(&name)
                .unwrap_or_default();
            let collection_clone = self.clone_collection_items(&clone, &source_collection, key, &name)?;
            clone.attach_collection(&name, collection_clone)?;
        }

        if self.method == CloneMethod::Memberwise {
            self.mapped.remove(&key);
        }
        Ok(clone)
    }

    fn clone_collection_items(
        &mut self,
        owner_clone: &EntityHandle,
        source: &CollectionHandle,
        owner_key: VisitKey,
        name: &str,
    ) -> GraphResult<CollectionHandle> {
        let clone = CollectionHandle::new();
        if source.is_associative() {
            clone.set_parent(Some(owner_clone.clone()));
        }
        for excluded in source.excluded_properties() {
            clone.exclude_property(&excluded);
        }
        for item in source.items() {
            let included = match self.marks {
                Some(marks) => marks.is_item_included(owner_key, name, item.key()),
                None => true,
            };
            if included {
                let item_clone = self.clone_entity(&item)?;
                clone.push_untracked(item_clone);
            }
        }
        Ok(clone)
    }
}

/// Full, unguided deep copy of a single entity graph.
pub fn clone_graph(entity: &EntityHandle, method: CloneMethod) -> GraphResult<EntityHandle> {
    GraphCloner::new(method).clone_entity(entity)
}

/// Full, unguided deep copy of a collection and everything it reaches.
/// The copy is untracked and carries no cached deletions.
pub fn clone_collection(
    collection: &CollectionHandle,
    method: CloneMethod,
) -> GraphResult<CollectionHandle> {
    let mut cloner = GraphCloner::new(method);
    let clone = CollectionHandle::new();
    for excluded in collection.excluded_properties() {
        clone.exclude_property(&excluded);
    }
    for item in collection.items() {
        let item_clone = cloner.clone_entity(&item)?;
        clone.push_untracked(item_clone);
    }
    Ok(clone)
}
