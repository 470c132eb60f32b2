use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Album name used for photos whose timestamp cannot be parsed.
pub const UNDATED_ALBUM: &str = "Undated Photos";

/// Date-times carrying an explicit numeric offset that RFC 3339 parsing rejects
/// (minute precision).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Date-times without an offset, interpreted as UTC. `%.f` is optional when parsing.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Map a timestamp to the display name of the album it belongs to.
///
/// Valid timestamps yield the long US form of their UTC calendar day
/// (`"October 26, 2023"`). Anything unparsable, including the empty string,
/// yields [`UNDATED_ALBUM`] so that one bad timestamp never aborts a batch.
pub fn album_name_for(timestamp: &str) -> String {
    match parse_calendar_day(timestamp.trim()) {
        Some(day) => day.format("%B %-d, %Y").to_string(),
        None => UNDATED_ALBUM.to_string(),
    }
}

/// Parse a timestamp into its UTC calendar day.
pub fn parse_calendar_day(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    let naive = s
        .strip_suffix('Z')
        .or_else(|| s.strip_suffix('z'))
        .unwrap_or(s);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_utc() {
        assert_eq!(album_name_for("2023-10-26T10:00:00Z"), "October 26, 2023");
    }

    #[test]
    fn test_invalid_and_empty_fall_back_to_sentinel() {
        assert_eq!(album_name_for("invalid-date"), UNDATED_ALBUM);
        assert_eq!(album_name_for(""), UNDATED_ALBUM);
        assert_eq!(album_name_for("   "), UNDATED_ALBUM);
        assert_eq!(album_name_for("2023-13-01"), UNDATED_ALBUM);
        assert_eq!(album_name_for("2023-02-30T10:00:00Z"), UNDATED_ALBUM);
    }

    #[test]
    fn test_minute_precision_with_z() {
        assert_eq!(album_name_for("2023-01-15T10:00Z"), "January 15, 2023");
        assert_eq!(album_name_for("2023-02-20T12:00Z"), "February 20, 2023");
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(album_name_for("2024-03-05T08:15:30.123Z"), "March 5, 2024");
    }

    #[test]
    fn test_offset_is_converted_to_utc_day() {
        // 23:30 at -05:00 is already the next day in UTC.
        assert_eq!(album_name_for("2023-12-31T23:30:00-05:00"), "January 1, 2024");
        assert_eq!(album_name_for("2023-06-01T00:30+02:00"), "May 31, 2023");
    }

    #[test]
    fn test_naive_inputs() {
        assert_eq!(album_name_for("2022-07-04"), "July 4, 2022");
        assert_eq!(album_name_for("2022-07-04T09:00:00"), "July 4, 2022");
        assert_eq!(album_name_for("2022-07-04 09:00"), "July 4, 2022");
    }

    #[test]
    fn test_deterministic() {
        let inputs = ["2023-10-26T10:00:00Z", "2001-01-01", "nope", ""];
        for input in inputs {
            assert_eq!(album_name_for(input), album_name_for(input));
        }
    }

    #[test]
    fn test_same_day_groups_together() {
        assert_eq!(
            album_name_for("2023-01-15T10:00Z"),
            album_name_for("2023-01-15T11:00Z")
        );
        assert_ne!(
            album_name_for("2023-01-15T10:00Z"),
            album_name_for("2023-02-20T12:00Z")
        );
    }
}
