//! Per-entity compare-and-set decision (§4.4).

/// What to do with one incoming entity, given its current server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply as a fresh insert at version 1. Base version is ignored.
    Insert,
    /// Apply as an update; carries the version to store (current + 1, or
    /// for a resurrection, `max(current, base) + 1`).
    Apply { new_version: i64, resurrect: bool },
    /// Reject: server wins, caller should report the current server state.
    Conflict,
    /// Idempotent no-op: a delete applied against an already-deleted
    /// tombstone. Not an error, not a version bump.
    NoOp,
}

/// `server` is `None` when the entity does not exist yet. `server_deleted`
/// only matters for trackers; entries pass `false`.
pub fn decide(
    server: Option<(i64, bool)>,
    incoming_base_version: i64,
    incoming_is_delete: bool,
) -> Decision {
    let Some((server_version, server_deleted)) = server else {
        return Decision::Insert;
    };

    if server_deleted {
        return if incoming_is_delete {
            Decision::NoOp
        } else {
            Decision::Apply {
                new_version: server_version.max(incoming_base_version) + 1,
                resurrect: true,
            }
        };
    }

    if server_version == incoming_base_version {
        Decision::Apply {
            new_version: server_version + 1,
            resurrect: false,
        }
    } else {
        Decision::Conflict
    }
}
