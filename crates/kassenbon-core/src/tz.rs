//! Timezone helpers
//!
//! The configured zone is an IANA name (default "Europe/Berlin"). An
//! unresolvable name falls back to the local system timezone rather than
//! failing the ingest.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use chrono_tz::Tz;

/// Current time in the configured zone, as a fixed-offset timestamp.
pub fn now_in(tz: &str) -> DateTime<FixedOffset> {
    match tz.parse::<Tz>() {
        Ok(zone) => Utc::now().with_timezone(&zone).fixed_offset(),
        Err(_) => Local::now().fixed_offset(),
    }
}

/// Build a timestamp for the given wall-clock fields in the configured
/// zone. Returns None for invalid calendar dates or nonexistent local
/// times (DST gaps).
pub fn datetime_in(
    tz: &str,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<FixedOffset>> {
    match tz.parse::<Tz>() {
        Ok(zone) => zone
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .map(|dt| dt.fixed_offset()),
        Err(_) => Local
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .earliest()
            .map(|dt| dt.fixed_offset()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn berlin_winter_offset() {
        let dt = datetime_in("Europe/Berlin", 2025, 12, 29, 12, 7).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-12-29T12:07:00+01:00");
    }

    #[test]
    fn berlin_summer_offset() {
        let dt = datetime_in("Europe/Berlin", 2025, 7, 1, 9, 0).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-07-01T09:00:00+02:00");
    }

    #[test]
    fn invalid_date_yields_none() {
        assert!(datetime_in("Europe/Berlin", 2025, 13, 40, 0, 0).is_none());
    }

    #[test]
    fn unknown_zone_falls_back_to_local() {
        // Must not panic, and must produce some timestamp.
        let dt = datetime_in("Not/AZone", 2025, 1, 15, 10, 30);
        assert!(dt.is_some());
        let _ = now_in("Not/AZone");
    }
}
