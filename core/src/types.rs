//! Domain entities produced by the normalizer.
//!
//! These are plain value objects with typed fields. Wire quirks (string
//! numerics, per-endpoint field subsets) never leak past `normalize`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Layout of every timestamp the service emits, e.g. `2020/05/05 12:30`.
pub const DATETIME_LAYOUT: &str = "%Y/%m/%d %H:%M";

/// A single bike-count observation at a spot.
///
/// The timestamp is the service's local wall-clock time; no zone is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeCount {
    pub timestamp: NaiveDateTime,
    pub count: i64,
}

impl BikeCount {
    /// Build a count from its wire strings. Returns `None` unless both the
    /// timestamp and the count parse; there is no partially filled count.
    ///
    /// The timestamp must match the layout exactly: zero-padded fields, no
    /// surrounding whitespace.
    pub fn parse(datetime: &str, count: &str) -> Option<Self> {
        let timestamp = NaiveDateTime::parse_from_str(datetime, DATETIME_LAYOUT).ok()?;
        if timestamp.format(DATETIME_LAYOUT).to_string() != datetime {
            return None;
        }
        let count = count.parse().ok()?;
        Some(Self { timestamp, count })
    }
}

/// A bike-parking spot with whatever counts the endpoint returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotInfo {
    pub area: String,
    pub spot: String,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    pub counts: Vec<BikeCount>,
}

/// A spot paired with its distance from the search origin. The distance is
/// passed through as the service formats it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotDistance {
    pub spot: SpotInfo,
    pub distance: String,
}

/// Result of a nearest-spot search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceInfo {
    pub base_lat: f64,
    pub base_lon: f64,
    pub spots: Vec<SpotDistance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotName {
    pub area: String,
    pub spot: String,
    pub name: String,
}

/// Metadata for a rendered usage-graph image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub title: String,
    pub width: i64,
    pub height: i64,
    pub url: String,
}

/// A registered user of the notification bots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub line_id: String,
    pub slack_id: String,
    pub favorites: Vec<String>,
    pub histories: Vec<String>,
    pub notifies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn bike_count_parses_valid_pair() {
        let count = BikeCount::parse("2020/05/05 12:30", "7").unwrap();
        let expected = NaiveDate::from_ymd_opt(2020, 5, 5)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(count.timestamp, expected);
        assert_eq!(count.count, 7);
    }

    #[test]
    fn bike_count_rejects_bad_count() {
        assert!(BikeCount::parse("2020/05/05 12:30", "seven").is_none());
        assert!(BikeCount::parse("2020/05/05 12:30", "").is_none());
    }

    #[test]
    fn bike_count_rejects_bad_timestamp() {
        assert!(BikeCount::parse("not-a-date", "7").is_none());
        assert!(BikeCount::parse("2020-05-05 12:30", "7").is_none());
        assert!(BikeCount::parse("2020/05/05 25:30", "7").is_none());
        assert!(BikeCount::parse("2020/5/5 1:3", "7").is_none());
        assert!(BikeCount::parse(" 2020/05/05 12:30", "7").is_none());
        assert!(BikeCount::parse("2020/05/05 12:30 ", "7").is_none());
    }

    #[test]
    fn bike_count_uses_24_hour_clock() {
        let count = BikeCount::parse("2020/05/05 23:05", "0").unwrap();
        assert_eq!(count.timestamp.format("%H:%M").to_string(), "23:05");
        assert_eq!(count.count, 0);
    }
}
