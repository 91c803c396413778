//! Relative time phrases ("3 hours ago") for digest lines

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;

/// (upper bound in seconds, singular phrase, unit for plurals, divisor)
const MAGNITUDES: &[(i64, &str, &str, i64)] = &[
    (2, "1 second", "seconds", 1),
    (MINUTE, "", "seconds", 1),
    (2 * MINUTE, "1 minute", "minutes", MINUTE),
    (HOUR, "", "minutes", MINUTE),
    (2 * HOUR, "1 hour", "hours", HOUR),
    (DAY, "", "hours", HOUR),
    (2 * DAY, "1 day", "days", DAY),
    (WEEK, "", "days", DAY),
    (2 * WEEK, "1 week", "weeks", WEEK),
    (MONTH, "", "weeks", WEEK),
    (2 * MONTH, "1 month", "months", MONTH),
    (YEAR, "", "months", MONTH),
    (18 * MONTH, "1 year", "years", YEAR),
    (2 * YEAR, "2 years", "years", YEAR),
];

/// Describe `then` relative to `now`.
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use standup_bot::utils::humanize::relative_time;
///
/// let now = Utc::now();
/// assert_eq!(relative_time(now - TimeDelta::hours(3), now), "3 hours ago");
/// ```
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (seconds, suffix) = if then <= now {
        ((now - then).num_seconds(), "ago")
    } else {
        ((then - now).num_seconds(), "from now")
    };

    if seconds < 1 {
        return "now".to_string();
    }

    for &(below, singular, unit, divisor) in MAGNITUDES {
        if seconds < below {
            if singular.is_empty() {
                return format!("{} {unit} {suffix}", seconds / divisor);
            }
            return format!("{singular} {suffix}");
        }
    }

    format!("{} years {suffix}", seconds / YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn ago(delta: TimeDelta) -> String {
        let now = Utc::now();
        relative_time(now - delta, now)
    }

    #[test]
    fn covers_each_magnitude() {
        assert_eq!(ago(TimeDelta::zero()), "now");
        assert_eq!(ago(TimeDelta::seconds(1)), "1 second ago");
        assert_eq!(ago(TimeDelta::seconds(42)), "42 seconds ago");
        assert_eq!(ago(TimeDelta::seconds(90)), "1 minute ago");
        assert_eq!(ago(TimeDelta::minutes(15)), "15 minutes ago");
        assert_eq!(ago(TimeDelta::minutes(61)), "1 hour ago");
        assert_eq!(ago(TimeDelta::hours(3)), "3 hours ago");
        assert_eq!(ago(TimeDelta::hours(30)), "1 day ago");
        assert_eq!(ago(TimeDelta::days(4)), "4 days ago");
        assert_eq!(ago(TimeDelta::days(8)), "1 week ago");
        assert_eq!(ago(TimeDelta::days(21)), "3 weeks ago");
        assert_eq!(ago(TimeDelta::days(45)), "1 month ago");
        assert_eq!(ago(TimeDelta::days(200)), "6 months ago");
        assert_eq!(ago(TimeDelta::days(400)), "1 year ago");
        assert_eq!(ago(TimeDelta::days(600)), "2 years ago");
        assert_eq!(ago(TimeDelta::days(1500)), "4 years ago");
    }

    #[test]
    fn future_instants_read_from_now() {
        let now = Utc::now();
        assert_eq!(
            relative_time(now + TimeDelta::minutes(5), now),
            "5 minutes from now"
        );
    }
}
