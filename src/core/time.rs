//! Shared timestamp helpers for persisted records.

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

/// Parses an epoch-Z timestamp back into seconds. Returns `None` for
/// anything that does not match the `<digits>Z` shape.
pub fn parse_epoch_z(ts: &str) -> Option<u64> {
    ts.strip_suffix('Z')?.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_epoch_z_format() {
        let result = now_epoch_z();
        assert!(result.ends_with('Z'));
        let numeric_part = result.trim_end_matches('Z');
        assert!(numeric_part.parse::<u64>().is_ok());
    }

    #[test]
    fn test_parse_epoch_z_round_trip() {
        let now = now_epoch_z();
        assert!(parse_epoch_z(&now).is_some());
    }

    #[test]
    fn test_parse_epoch_z_rejects_garbage() {
        assert_eq!(parse_epoch_z("not-a-timestamp"), None);
        assert_eq!(parse_epoch_z("123"), None);
        assert_eq!(parse_epoch_z(""), None);
    }
}
