//! Retrace Diff
//!
//! Change-set extraction over the live tracked graph.
//!
//! Responsibilities:
//! - Replay and retract cached deletions so pending deletes participate in
//!   extraction without permanently rejoining the live graph
//! - The mark phase: decide which entities, reference links and collection
//!   items belong in the change-set
//! - Guided graph cloning, with a memberwise and an identity-preserving
//!   strategy
//! - `get_changes` orchestration with guaranteed splice cleanup
//! - Baseline acceptance after a change-set has been persisted
//!
//! # Module Structure
//!
//! - `restore` - Splice/unsplice of cached deletions
//! - `mark` - Inclusion decisions over the post-restore graph
//! - `clone` - Guided deep copies
//! - `extract` - `get_changes` orchestration
//! - `accept` - Rebasing the graph to an `Unchanged` baseline
//! - `error` - Error types for extraction

mod accept;
mod clone;
mod error;
mod extract;
mod mark;
mod restore;

pub use accept::{accept_changes, accept_entity_changes};
pub use clone::{clone_collection, clone_graph, CloneMethod, GraphCloner};
pub use error::{DiffError, DiffResult};
pub use extract::{extract_changes, extract_changes_with, CollectionDiffExt};
pub use mark::ChangeMarks;
pub use restore::{remove_restored_deletes, restore_deletes};
