//! Conflict descriptors (in-band, per update response) and conflict log
//! rows (persisted, one per resolution event).

use serde::Serialize;
use serde_json::Value;

use super::entity_type::EntityType;

/// Carried in an `update` response body when an entity's write is rejected.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDescriptor {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub server_version: i64,
    pub client_base_version: i64,
    pub server_data: Value,
}

/// A resolution that took place, whichever side won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Client,
    Server,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Client => "client",
            Resolution::Server => "server",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client" => Some(Resolution::Client),
            "server" => Some(Resolution::Server),
            _ => None,
        }
    }
}

/// One persisted log row per resolution event (§3: unresolved conflicts are
/// never stored, only what was actually resolved).
#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub resolution: Resolution,
    pub client_id: String,
    pub resolved_at: String,
}
