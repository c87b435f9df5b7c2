//! Reserved property names.
//!
//! Property-change notifications carrying one of these names describe the
//! tracking metadata itself and must never promote an entity to `Modified`.

/// Notification name for writes to an entity's tracking state.
pub const TRACKING_STATE_PROPERTY: &str = "tracking_state";

/// Notification name for writes to an entity's modified-property set.
pub const MODIFIED_PROPERTIES_PROPERTY: &str = "modified_properties";

/// Returns true if the property name is tracking metadata rather than data.
pub fn is_reserved_property(name: &str) -> bool {
    name == TRACKING_STATE_PROPERTY || name == MODIFIED_PROPERTIES_PROPERTY
}
