//! Timestamp normalization

use chrono::DateTime;
use login_pipeline_types::RawTimestamp;

/// Output format for normalized timestamps (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Substituted when a timestamp cannot be normalized
pub const INVALID_TIMESTAMP: &str = "invalid_timestamp";

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS` in UTC
///
/// Returns `None` if the value is not an integer or falls outside the
/// representable date range.
pub fn format_epoch_seconds(raw: &RawTimestamp) -> Option<String> {
    let secs = raw.to_epoch_seconds()?;
    let datetime = DateTime::from_timestamp(secs, 0)?;
    Some(datetime.format(TIMESTAMP_FORMAT).to_string())
}

/// Like [`format_epoch_seconds`] but falls back to [`INVALID_TIMESTAMP`]
pub fn normalize_timestamp(raw: &RawTimestamp) -> String {
    format_epoch_seconds(raw).unwrap_or_else(|| INVALID_TIMESTAMP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_zero() {
        assert_eq!(normalize_timestamp(&RawTimestamp::Integer(0)), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_string_epoch() {
        assert_eq!(
            normalize_timestamp(&RawTimestamp::from("1694479551")),
            "2023-09-12 00:45:51"
        );
    }

    #[test]
    fn test_negative_epoch() {
        assert_eq!(normalize_timestamp(&RawTimestamp::Integer(-1)), "1969-12-31 23:59:59");
    }

    #[test]
    fn test_unparsable_values() {
        assert_eq!(normalize_timestamp(&RawTimestamp::from("soon")), INVALID_TIMESTAMP);
        assert_eq!(normalize_timestamp(&RawTimestamp::from("12.5")), INVALID_TIMESTAMP);
        assert_eq!(normalize_timestamp(&RawTimestamp::Integer(i64::MAX)), INVALID_TIMESTAMP);
    }
}
