//! Client: a known device participating in sync.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub first_seen_at: String,
    pub last_seen_at: String,
}

/// Default display name for a client that didn't supply one: the prefix of
/// its id up to (not including) the first `-`.
pub fn default_client_name(client_id: &str) -> String {
    match client_id.split_once('-') {
        Some((prefix, _)) => prefix.to_string(),
        None => client_id.to_string(),
    }
}
