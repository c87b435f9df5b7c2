//! Mark phase of change extraction.
//!
//! A single cycle-guarded walk over the (post-restore) graph decides, for
//! every reachable entity, whether it belongs in the change-set, and records
//! exactly which reference links to null out and which collection items to
//! keep, so the clone phase needs no further graph analysis.
//!
//! Inclusion is asymmetric across link kinds. A collection item pulls its
//! owner in through any change, deletions included: the owner's collection
//! is where the deletion must be persisted. A reference target pulls its
//! owner in only through live changes (`Added`/`Modified`, or changes
//! further downstream); a target's pending deletion belongs to whichever
//! collection owns the target, not to entities that merely point at it. An
//! entity sighted a second time contributes nothing where it is re-sighted:
//! everything it leads to was accounted for where it was first walked.

use std::collections::{HashMap, HashSet};

use retrace_core::{TrackingState, VisitKey, VisitationTracker};
use retrace_graph::{navigation_entries, EntityHandle, GraphResult, NavigationEntry};

/// Inclusion decisions recorded by the mark phase.
#[derive(Debug, Default)]
pub struct ChangeMarks {
    /// Per entity: reference properties whose target contributes nothing and
    /// is nulled out in the clone.
    omitted_references: HashMap<VisitKey, HashSet<String>>,
    /// Per (entity, collection property): the items kept in the clone.
    included_items: HashMap<(VisitKey, String), HashSet<VisitKey>>,
    /// Per walked entity: whether it carries or leads to a change.
    decisions: HashMap<VisitKey, bool>,
}

impl ChangeMarks {
    /// Walk the graph from the given roots and record inclusion decisions.
    /// Returns the marks together with the subset of roots that made the cut.
    pub fn compute(roots: &[EntityHandle]) -> GraphResult<(Self, Vec<EntityHandle>)> {
        let mut marks = ChangeMarks::default();
        let mut tracker = VisitationTracker::new();
        let mut included = Vec::new();
        for root in roots {
            let downstream = if tracker.try_visit(root.key()) {
                marks.mark_entity(root, &mut tracker)?
            } else {
                false
            };
            if root.tracking_state().is_changed() || downstream {
                included.push(root.clone());
            }
        }
        Ok((marks, included))
    }

    /// True if the clone of `entity` should drop the named reference link.
    pub fn is_reference_omitted(&self, entity: VisitKey, name: &str) -> bool {
        self.omitted_references
            .get(&entity)
            .is_some_and(|names| names.contains(name))
    }

    /// True if the clone of `entity`'s named collection should keep `item`.
    pub fn is_item_included(&self, entity: VisitKey, name: &str, item: VisitKey) -> bool {
        self.included_items
            .get(&(entity, name.to_string()))
            .is_some_and(|items| items.contains(&item))
    }

    /// Whether a walked entity carries or leads to a change.
    pub fn is_included(&self, entity: VisitKey) -> bool {
        self.decisions.get(&entity).copied().unwrap_or(false)
    }

    /// Walk one first-sighted entity's navigation links. Returns whether any
    /// of them leads to a change; the caller combines that with the entity's
    /// own state. The caller must already have visited `entity` in `tracker`.
    fn mark_entity(
        &mut self,
        entity: &EntityHandle,
        tracker: &mut VisitationTracker,
    ) -> GraphResult<bool> {
        let key = entity.key();
        let mut downstream = false;
        for entry in navigation_entries(entity)? {
            match entry {
                NavigationEntry::Reference { name, target } => {
                    let Some(target) = target else { continue };
                    let state = target.tracking_state();
                    let target_downstream = if tracker.try_visit(target.key()) {
                        self.mark_entity(&target, tracker)?
                    } else {
                        false
                    };
                    if target_downstream
                        || matches!(state, TrackingState::Added | TrackingState::Modified)
                    {
                        downstream = true;
                    } else if state == TrackingState::Unchanged {
                        self.omitted_references
                            .entry(key)
                            .or_default()
                            .insert(name);
                    }
                }
                NavigationEntry::Collection { name, collection } => {
                    if collection.is_empty() {
                        continue;
                    }
                    let mut kept = HashSet::new();
                    for item in collection.items() {
                        let item_downstream = if tracker.try_visit(item.key()) {
                            self.mark_entity(&item, tracker)?
                        } else {
                            false
                        };
                        if item.tracking_state().is_changed() || item_downstream {
                            kept.insert(item.key());
                            downstream = true;
                        }
                    }
                    self.included_items.insert((key, name), kept);
                }
            }
        }
        self.decisions
            .insert(key, entity.tracking_state().is_changed() || downstream);
        Ok(downstream)
    }
}
