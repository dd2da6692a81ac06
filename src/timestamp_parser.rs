use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Handles the timestamp formats that show up in exported authentication logs
pub struct TimestampParser;

impl TimestampParser {
    /// Parse an event timestamp into a `DateTime<Utc>`.
    ///
    /// Accepts RFC 3339 (with `Z` or explicit offset), a naive datetime
    /// assumed UTC, and a bare calendar date taken as midnight UTC.
    pub fn parse(timestamp_str: &str) -> Result<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp_str) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }

        if let Ok(day) = NaiveDate::parse_from_str(timestamp_str, "%Y-%m-%d") {
            if let Some(naive) = day.and_hms_opt(0, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }

        anyhow::bail!("Failed to parse timestamp: {}", timestamp_str)
    }

    /// Parse a `YYYY-MM-DD` filter bound.
    pub fn parse_day(day_str: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(day_str, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid date: {}. Use YYYY-MM-DD", day_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_z_suffix() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000Z");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_offset() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000+02:00");
        assert_eq!(
            result.unwrap(),
            TimestampParser::parse("2024-01-01T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_parse_naive() {
        let result = TimestampParser::parse("2024-01-01T12:00:00.000");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_date_only() {
        let result = TimestampParser::parse("2024-01-01").unwrap();
        assert_eq!(
            result.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid() {
        let result = TimestampParser::parse("invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_day() {
        assert!(TimestampParser::parse_day("2024-02-29").is_ok());
        assert!(TimestampParser::parse_day("2024-13-01").is_err());
        assert!(TimestampParser::parse_day("yesterday").is_err());
    }
}
