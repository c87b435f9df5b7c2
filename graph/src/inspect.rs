//! Navigation inspection.
//!
//! The capability contract through which every recursive walker discovers an
//! entity's navigation links. Entities normally rely on the default
//! inspector, which enumerates their declared slots; an entity may install a
//! custom [`NavigationInspector`] to expose synthetic relationships or to
//! reshape what the walkers see.

use crate::collection::CollectionHandle;
use crate::entity::EntityHandle;
use crate::error::{GraphError, GraphResult};

/// One navigation link of an entity, as seen by a graph walker.
#[derive(Debug, Clone)]
pub enum NavigationEntry {
    /// 0..1 relation to another entity.
    Reference {
        name: String,
        target: Option<EntityHandle>,
    },
    /// 0..n relation backed by a tracking collection.
    Collection {
        name: String,
        collection: CollectionHandle,
    },
}

/// Capability contract for enumerating an entity's navigation links.
///
/// Fallible so custom inspectors can surface resolution failures; walkers
/// propagate such errors to their caller instead of guessing.
pub trait NavigationInspector {
    /// Produce the entity's navigation entries.
    fn navigation_entries(&self, entity: &EntityHandle) -> GraphResult<Vec<NavigationEntry>>;
}

/// Default inspector: enumerates the entity's declared navigation slots.
/// Reference slots without a target are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredNavigationInspector;

impl NavigationInspector for DeclaredNavigationInspector {
    fn navigation_entries(&self, entity: &EntityHandle) -> GraphResult<Vec<NavigationEntry>> {
        let mut entries = Vec::new();
        for name in entity.reference_names() {
            let Some(target) = entity.reference(&name) else {
                continue;
            };
            entries.push(NavigationEntry::Reference {
                name,
                target: Some(target),
            });
        }
        for name in entity.collection_names() {
            if let Some(collection) = collection_for(entity, &name) {
                entries.push(NavigationEntry::Collection { name, collection });
            }
        }
        Ok(entries)
    }
}

/// Enumerate an entity's navigation entries through its custom inspector,
/// falling back to the default declared-slot inspector.
pub fn navigation_entries(entity: &EntityHandle) -> GraphResult<Vec<NavigationEntry>> {
    match entity.inspector() {
        Some(custom) => custom.navigation_entries(entity),
        None => DeclaredNavigationInspector.navigation_entries(entity),
    }
}

/// Look up the concrete tracking collection behind a named collection
/// navigation property.
pub fn collection_for(entity: &EntityHandle, name: &str) -> Option<CollectionHandle> {
    entity.collection(name)
}

/// Look up the backing tracker of a named reference navigation property.
/// Returns `None` for undeclared names; walkers skip such entries the same
/// way they skip unset references.
pub fn reference_tracker(entity: &EntityHandle, name: &str) -> Option<CollectionHandle> {
    entity.reference_tracker(name)
}

/// Like [`reference_tracker`], but a missing tracker is an error. This is
/// the lookup collaborators use when propagation must act on the concrete
/// backing collection and silent fallback would hide a modeling bug.
pub fn require_reference_tracker(
    entity: &EntityHandle,
    name: &str,
) -> GraphResult<CollectionHandle> {
    reference_tracker(entity, name).ok_or_else(|| GraphError::UnresolvedReferenceTracker {
        name: name.to_string(),
    })
}
