//! Retrace Core Types
//!
//! This crate provides the foundational types used throughout the Retrace
//! change-tracking engine:
//! - Tracking state lifecycle (TrackingState)
//! - Correlation identifiers (EntityId)
//! - Value types (the Value enum for scalar entity properties)
//! - The cycle guard used by every recursive graph walk (VisitationTracker)
//! - Reserved tracking-metadata property names

mod id;
mod reserved;
mod state;
mod value;
mod visit;

pub use id::*;
pub use reserved::*;
pub use state::*;
pub use value::*;
pub use visit::*;
