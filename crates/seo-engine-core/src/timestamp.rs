//! Lenient timestamp parsing for backend payloads.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Parse an RFC 3339 timestamp, or a naive ISO 8601 one taken as UTC.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter: missing, `null` or unparseable values become `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_lenient))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_lenient("2024-03-01T12:00:00+02:00").expect("parsed");
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn parses_naive_iso_as_utc() {
        let ts = parse_lenient("2024-03-01T12:30:45.123456").expect("parsed");
        assert_eq!((ts.year(), ts.hour(), ts.minute()), (2024, 12, 30));
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_lenient("yesterday").is_none());
        assert!(parse_lenient("   ").is_none());
    }
}
