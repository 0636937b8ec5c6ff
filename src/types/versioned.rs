//! Shared versioning contract for entities subject to sync.
//!
//! Clients attach reserved keys to JSON payloads to carry version and
//! provenance metadata alongside the entity's own fields. These keys are
//! stripped before storage and re-synthesized on every read.

pub const KEY_BASE_VERSION: &str = "_baseVersion";
pub const KEY_VERSION: &str = "_version";
pub const KEY_DELETED: &str = "_deleted";
pub const KEY_LAST_MODIFIED_BY: &str = "_lastModifiedBy";
pub const KEY_LAST_MODIFIED_AT: &str = "_lastModifiedAt";

/// Strips the reserved keys (`_baseVersion`, `_version`, `_deleted`,
/// `_lastModifiedBy`, `_lastModifiedAt`) out of a JSON object, returning the
/// remaining keys untouched. Used to build a tracker's opaque metadata bag.
pub fn strip_reserved_keys(mut object: serde_json::Map<String, serde_json::Value>) -> serde_json::Map<String, serde_json::Value> {
    object.remove(KEY_BASE_VERSION);
    object.remove(KEY_VERSION);
    object.remove(KEY_DELETED);
    object.remove(KEY_LAST_MODIFIED_BY);
    object.remove(KEY_LAST_MODIFIED_AT);
    object
}
