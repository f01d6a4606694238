//! Request-scoped metadata helpers
//!
//! Every result carries a timestamp and a generated identifier. Neither is
//! load-bearing for the computed values; they only tag a response.

use chrono::{DateTime, Local, SecondsFormat};
use uuid::Uuid;

/// Current local time as an RFC 3339 string with microsecond precision
pub fn timestamp_now() -> String {
    format_timestamp(&Local::now())
}

/// Format a point in time the way every response reports it
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Fresh random (v4) identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_parses_back() {
        let ts = timestamp_now();
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok(), "bad timestamp: {}", ts);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
