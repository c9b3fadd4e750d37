use crate::error::{CoreError, Result};
use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Formats a timestamp the way documents store it.
pub fn to_rfc3339(datetime: OffsetDateTime) -> Result<String> {
    Ok(datetime.format(&Rfc3339)?)
}

pub fn parse_rfc3339(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| CoreError::invalid_timestamp(format!("'{value}': {e}")))
}

/// Elapsed waiting time, truncated to whole minutes.
///
/// Displays as `"45min"` below one hour and `"2h 5min"` from there on.
/// A start in the future counts as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WaitTime {
    minutes: i64,
}

impl WaitTime {
    pub fn between(since: OffsetDateTime, now: OffsetDateTime) -> Self {
        Self {
            minutes: (now - since).whole_minutes().max(0),
        }
    }

    pub fn from_minutes(minutes: i64) -> Self {
        Self {
            minutes: minutes.max(0),
        }
    }

    pub fn total_minutes(&self) -> i64 {
        self.minutes
    }

    pub fn hours(&self) -> i64 {
        self.minutes / 60
    }
}

impl fmt::Display for WaitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.minutes / 60;
        let minutes = self.minutes % 60;
        if hours > 0 {
            write!(f, "{hours}h {minutes}min")
        } else {
            write!(f, "{minutes}min")
        }
    }
}

pub fn format_wait(since: OffsetDateTime, now: OffsetDateTime) -> String {
    WaitTime::between(since, now).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn test_format_wait_hours_and_minutes() {
        let now = datetime!(2024-03-10 14:30:00 UTC);
        let since = now - Duration::minutes(125);
        assert_eq!(format_wait(since, now), "2h 5min");
    }

    #[test]
    fn test_format_wait_under_an_hour() {
        let now = datetime!(2024-03-10 14:30:00 UTC);
        assert_eq!(format_wait(now - Duration::minutes(45), now), "45min");
        assert_eq!(format_wait(now, now), "0min");
    }

    #[test]
    fn test_format_wait_truncates_seconds() {
        let now = datetime!(2024-03-10 14:30:00 UTC);
        let since = now - Duration::seconds(60 * 60 + 59);
        assert_eq!(format_wait(since, now), "1h 0min");
    }

    #[test]
    fn test_future_start_counts_as_zero() {
        let now = datetime!(2024-03-10 14:30:00 UTC);
        let wait = WaitTime::between(now + Duration::minutes(10), now);
        assert_eq!(wait.total_minutes(), 0);
    }

    #[test]
    fn test_wait_time_ordering() {
        assert!(WaitTime::from_minutes(90) > WaitTime::from_minutes(30));
        assert_eq!(WaitTime::from_minutes(-5).total_minutes(), 0);
        assert_eq!(WaitTime::from_minutes(185).hours(), 3);
    }

    #[test]
    fn test_rfc3339_roundtrip_format() {
        let dt = datetime!(2023-05-15 14:30:00 UTC);
        let formatted = to_rfc3339(dt).unwrap();
        assert_eq!(formatted, "2023-05-15T14:30:00Z");
        assert_eq!(parse_rfc3339(&formatted).unwrap(), dt);
    }

    #[test]
    fn test_parse_rfc3339_invalid() {
        assert!(parse_rfc3339("invalid-date").is_err());
        assert!(parse_rfc3339("").is_err());
    }
}
