//! Date normalization shared by the normalizer, the ledger and the exporters.
//!
//! Every date the tracker handles is a calendar date with no time component.
//! Inputs written by other tools may carry a time suffix (`2024-03-01T10:00:00Z`),
//! which is dropped before parsing.

use chrono::{Local, NaiveDate};

use crate::error::{Result, TrackerError};

pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO date, ignoring anything after the `YYYY-MM-DD` prefix
pub fn parse_iso(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, ISO_FORMAT).map_err(|err| {
        TrackerError::validation("date", format!("`{input}` is not a YYYY-MM-DD date ({err})"))
    })
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

/// Today's date on the local clock
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Serde adapter that writes `YYYY-MM-DD` and reads through [`parse_iso`]
pub mod iso {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_plain_dates() {
        assert_eq!(parse_iso("2025-06-01").unwrap(), ymd(2025, 6, 1));
    }

    #[test]
    fn truncates_time_component() {
        assert_eq!(parse_iso("2024-03-01T23:59:59.000Z").unwrap(), ymd(2024, 3, 1));
        assert_eq!(parse_iso("2024-03-01 08:00").unwrap(), ymd(2024, 3, 1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_iso("next tuesday"),
            Err(TrackerError::Validation { field: "date", .. })
        ));
        assert!(parse_iso("").is_err());
        assert!(parse_iso("2024-02-30").is_err());
    }

    #[test]
    fn formats_zero_padded() {
        assert_eq!(format_iso(ymd(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn date_order_matches_iso_string_order() {
        let earlier = parse_iso("2020-01-01").unwrap();
        let later = parse_iso("2025-01-01").unwrap();
        assert!(earlier < later);
        assert!(format_iso(earlier) < format_iso(later));
    }
}
