//! Composite entity id used by the resolution endpoint for entries.

use crate::error::AppError;

/// Splits `"YYYY-MM-DD|trackerId"` on the *first* `|` only, so a tracker id
/// containing `|` would corrupt the split if clients ever produced one
/// (trackers must not contain `|`; this is an implicit constraint of the
/// wire format, not separately validated here).
pub fn split_entry_entity_id(entity_id: &str) -> Result<(String, String), AppError> {
    match entity_id.split_once('|') {
        Some((date, tracker_id)) if !date.is_empty() && !tracker_id.is_empty() => {
            Ok((date.to_string(), tracker_id.to_string()))
        }
        _ => Err(AppError::Validation(format!(
            "malformed entry entity id: {entity_id}"
        ))),
    }
}

pub fn join_entry_entity_id(date: &str, tracker_id: &str) -> String {
    format!("{date}|{tracker_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic() {
        let (date, tracker_id) = split_entry_entity_id("2026-07-20|water").unwrap();
        assert_eq!(date, "2026-07-20");
        assert_eq!(tracker_id, "water");
    }

    #[test]
    fn test_split_only_on_first_pipe() {
        let (date, tracker_id) = split_entry_entity_id("2026-07-20|tracker|with|pipes").unwrap();
        assert_eq!(date, "2026-07-20");
        assert_eq!(tracker_id, "tracker|with|pipes");
    }

    #[test]
    fn test_split_missing_pipe_rejected() {
        assert!(split_entry_entity_id("2026-07-20").is_err());
    }

    #[test]
    fn test_join_round_trips() {
        let joined = join_entry_entity_id("2026-07-20", "water");
        assert_eq!(split_entry_entity_id(&joined).unwrap(), ("2026-07-20".to_string(), "water".to_string()));
    }
}
