//! Change-set extraction.
//!
//! `extract_changes` stitches the phases together: replay cached deletions
//! into the live graph, mark the changed subgraph, clone exactly the marked
//! portion, then splice the deletions back out. The splice pairing holds
//! even when marking or cloning fails, so a failed extraction never leaves
//! deleted entities visible in the live graph.

use retrace_graph::CollectionHandle;

use crate::clone::{CloneMethod, GraphCloner};
use crate::error::DiffResult;
use crate::mark::ChangeMarks;
use crate::restore::{remove_restored_deletes, restore_deletes};

/// Extract a pruned, structurally independent copy of everything that
/// changed under `collection`, preserving shared references in the copy.
///
/// The returned collection is untracked and contains only entities that are
/// non-`Unchanged` or lead to one, root deletions included.
pub fn extract_changes(collection: &CollectionHandle) -> DiffResult<CollectionHandle> {
    extract_changes_with(collection, CloneMethod::ReferencePreserving)
}

/// Like [`extract_changes`], with an explicit clone strategy. `Memberwise`
/// is cheaper but duplicates entities the change-set reaches through more
/// than one link.
pub fn extract_changes_with(
    collection: &CollectionHandle,
    method: CloneMethod,
) -> DiffResult<CollectionHandle> {
    restore_deletes(collection)?;
    let extracted = mark_and_clone(collection, method);
    let cleanup = remove_restored_deletes(collection);
    let changes = extracted?;
    cleanup?;
    Ok(changes)
}

fn mark_and_clone(
    collection: &CollectionHandle,
    method: CloneMethod,
) -> DiffResult<CollectionHandle> {
    // Post-restore view: cached root deletions are live items again, carry
    // state Deleted, and therefore mark themselves in.
    let roots = collection.items();
    let (marks, included) = ChangeMarks::compute(&roots)?;

    let mut cloner = GraphCloner::with_marks(method, &marks);
    let changes = CollectionHandle::new();
    for excluded in collection.excluded_properties() {
        changes.exclude_property(&excluded);
    }
    for root in included {
        let clone = cloner.clone_entity(&root)?;
        changes.push_untracked(clone);
    }
    Ok(changes)
}

/// Change extraction as a method on the collection handle.
pub trait CollectionDiffExt {
    /// See [`extract_changes`].
    fn get_changes(&self) -> DiffResult<CollectionHandle>;

    /// See [`extract_changes_with`].
    fn get_changes_with(&self, method: CloneMethod) -> DiffResult<CollectionHandle>;
}

impl CollectionDiffExt for CollectionHandle {
    fn get_changes(&self) -> DiffResult<CollectionHandle> {
        extract_changes(self)
    }

    fn get_changes_with(&self, method: CloneMethod) -> DiffResult<CollectionHandle> {
        extract_changes_with(self, method)
    }
}
