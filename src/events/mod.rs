//! Start/end event correlation over tagged search results
pub mod collection;
pub mod stats;

pub use collection::{EventCollection, EventHead};
pub use stats::{EventStats, EventSummary, LogEventStats, SearchResultIndices};

/// Format of the timestamp assembled from the day and time captures:
/// `YYYY-MM-DD HH:MM:SS.ffffff`, exactly six fractional digits.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";

/// Format used when rendering event timestamps.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Rounds to two decimals, halves to even.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_round2_halves_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(1.234567), 1.23);
        assert_eq!(round2(60.0), 60.0);
    }

    #[test]
    fn test_timestamp_requires_microseconds() {
        let ts = NaiveDateTime::parse_from_str("2021-07-19 09:01:58.498000", TIMESTAMP_FORMAT)
            .unwrap();
        assert_eq!(ts.format(DISPLAY_FORMAT).to_string(), "2021-07-19 09:01:58.498000");

        for bad in [
            "2021-07-19 09:01:58",
            "2021-07-19 09:01:58.498",
            "2021-07-19 09:01:58.498000123",
        ] {
            assert!(NaiveDateTime::parse_from_str(bad, TIMESTAMP_FORMAT).is_err(), "{bad}");
        }
    }
}
