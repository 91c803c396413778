//! Slack message timestamp helpers

use chrono::{DateTime, Utc};

use crate::errors::SlackError;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Parses a Slack `ts` of the form `<seconds>.<fraction>`.
///
/// The fractional integer is scaled by 1000 into nanoseconds, so `"10.5"` is
/// 10 s + 5 µs rather than 10.5 s. Only relative ordering between messages
/// relies on this value.
///
/// # Errors
///
/// Returns `ParseError` when either part is missing or not an integer.
///
/// # Examples
///
/// ```
/// use standup_bot::utils::slack_ts::parse_slack_ts;
///
/// let ts = parse_slack_ts("1700000000.000200").unwrap();
/// assert_eq!(ts.timestamp(), 1_700_000_000);
/// assert_eq!(ts.timestamp_subsec_nanos(), 200_000);
/// ```
pub fn parse_slack_ts(ts: &str) -> Result<DateTime<Utc>, SlackError> {
    let invalid = || SlackError::ParseError(format!("invalid Slack timestamp {ts:?}"));

    let (seconds, fraction) = ts.split_once('.').ok_or_else(invalid)?;
    let seconds: i64 = seconds.parse().map_err(|_| invalid())?;
    let fraction: i64 = fraction.parse().map_err(|_| invalid())?;

    let nanos = seconds
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|s| fraction.checked_mul(1000).and_then(|f| s.checked_add(f)))
        .ok_or_else(invalid)?;

    Ok(DateTime::from_timestamp_nanos(nanos))
}

/// Renders an instant as a Slack timestamp bound (`<seconds>.<micros>`).
#[must_use]
pub fn format_slack_ts(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seconds_and_scaled_fraction() {
        let ts = parse_slack_ts("1458170917.164398").unwrap();
        assert_eq!(ts.timestamp(), 1_458_170_917);
        assert_eq!(ts.timestamp_subsec_nanos(), 164_398_000);
    }

    #[test]
    fn short_fraction_is_scaled_literally() {
        let ts = parse_slack_ts("10.5").unwrap();
        assert_eq!(ts.timestamp(), 10);
        assert_eq!(ts.timestamp_subsec_nanos(), 5_000);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        for raw in ["", "1458170917", "abc.123", "123.xyz", ".5", "12."] {
            assert!(
                matches!(parse_slack_ts(raw), Err(SlackError::ParseError(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn formats_with_microsecond_precision() {
        let instant = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        assert_eq!(format_slack_ts(instant), "1700000000.250000");
    }

    #[test]
    fn slack_formatted_bounds_round_trip() {
        let parsed = parse_slack_ts("1700000000.000042").unwrap();
        assert_eq!(format_slack_ts(parsed), "1700000000.000042");
    }
}
