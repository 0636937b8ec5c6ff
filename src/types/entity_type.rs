//! Entity type discriminator shared by conflicts, resolutions, and deltas.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Tracker,
    Entry,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Tracker => "tracker",
            EntityType::Entry => "entry",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tracker" => Some(EntityType::Tracker),
            "entry" => Some(EntityType::Entry),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(EntityType::parse("tracker"), Some(EntityType::Tracker));
        assert_eq!(EntityType::parse("entry"), Some(EntityType::Entry));
        assert_eq!(EntityType::parse("bogus"), None);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(EntityType::Tracker.as_str(), "tracker");
        assert_eq!(EntityType::Entry.as_str(), "entry");
    }
}
