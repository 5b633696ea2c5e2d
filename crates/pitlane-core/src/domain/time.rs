//! Wall-clock conversions between circuit and user time zones.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ValidationError;

pub const DEFAULT_USER_TIMEZONE: &str = "America/Argentina/Cordoba";

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn parse_timezone(name: &str) -> Result<Tz, ValidationError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ValidationError::InvalidTimezone {
            value: name.to_string(),
        })
}

/// Parses an ISO local date-time without offset, seconds optional.
pub fn parse_local(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidLocalDateTime {
            value: value.to_string(),
        })
}

/// Attaches `zone` to a wall-clock time.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant. Times
/// inside a gap (clocks going forward) are shifted forward one hour.
pub fn localize(local: NaiveDateTime, zone: Tz) -> Result<DateTime<Tz>, ValidationError> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(value) => Ok(value),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => zone
            .from_local_datetime(&(local + TimeDelta::hours(1)))
            .earliest()
            .ok_or_else(|| ValidationError::NonexistentLocalTime {
                value: local.to_string(),
                timezone: zone.name().to_string(),
            }),
    }
}

/// Absolute instant of a wall-clock time in the named zone.
pub fn to_instant(local: NaiveDateTime, zone: &str) -> Result<DateTime<Utc>, ValidationError> {
    let zone = parse_timezone(zone)?;
    Ok(localize(local, zone)?.with_timezone(&Utc))
}

/// Converts a circuit wall-clock time into the user's zone.
pub fn to_user_zone(
    local: NaiveDateTime,
    circuit_zone: &str,
    user_zone: &str,
) -> Result<DateTime<Tz>, ValidationError> {
    let circuit = parse_timezone(circuit_zone)?;
    let user = parse_timezone(user_zone)?;
    Ok(localize(local, circuit)?.with_timezone(&user))
}

/// Wall-clock time of `instant` in the named zone.
pub fn to_zone_local<Z: TimeZone>(
    instant: &DateTime<Z>,
    zone: &str,
) -> Result<NaiveDateTime, ValidationError> {
    let zone = parse_timezone(zone)?;
    Ok(instant.with_timezone(&zone).naive_local())
}

/// `"{d}d {h}h {m}m"` until `target`, or `live_label` once it has started.
pub fn countdown(target: DateTime<Utc>, now: DateTime<Utc>, live_label: &str) -> String {
    if now >= target {
        return live_label.to_string();
    }
    let remaining = target - now;
    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    format!("{days}d {hours}h {minutes}m")
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn converts_circuit_time_to_user_zone() {
        let local = parse_local("2024-03-02T18:00:00").expect("valid");
        let converted = to_user_zone(local, "Asia/Bahrain", "Europe/Madrid").expect("valid zones");

        assert_eq!(converted.timezone().name(), "Europe/Madrid");
        assert_eq!(converted.hour(), 16);
    }

    #[test]
    fn round_trip_reconstructs_wall_clock() {
        let zones = [
            "Asia/Bahrain",
            "Australia/Melbourne",
            "America/Sao_Paulo",
            "Europe/Monaco",
            "America/Argentina/Cordoba",
            "UTC",
        ];
        let inputs = ["2025-03-16T15:00:00", "2025-10-26T02:30:00", "2025-12-07T17:00"];

        for circuit_zone in zones {
            for input in inputs {
                let local = parse_local(input).expect("valid");
                let user = to_user_zone(local, circuit_zone, DEFAULT_USER_TIMEZONE).expect("valid");
                let back = to_zone_local(&user, circuit_zone).expect("valid");
                assert_eq!(back, local, "{circuit_zone} {input}");
            }
        }
    }

    #[test]
    fn gap_times_move_forward_an_hour() {
        // Europe/Madrid springs forward at 02:00 on 2025-03-30.
        let local = parse_local("2025-03-30T02:30").expect("valid");
        let zoned = localize(local, parse_timezone("Europe/Madrid").expect("zone")).expect("shifted");

        assert_eq!(zoned.hour(), 3);
        assert_eq!(zoned.minute(), 30);
        assert_eq!(zoned.day(), 30);
    }

    #[test]
    fn rejects_unknown_zone_and_bad_input() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(ValidationError::InvalidTimezone { .. })
        ));
        assert!(matches!(
            parse_local("tomorrow"),
            Err(ValidationError::InvalidLocalDateTime { .. })
        ));
    }

    #[test]
    fn countdown_formats_remaining_time() {
        let target = Utc.with_ymd_and_hms(2024, 9, 1, 15, 0, 0).single().expect("valid");
        let now = target - TimeDelta::hours(5) - TimeDelta::minutes(15);

        assert_eq!(countdown(target, now, "Live"), "0d 5h 15m");
        assert_eq!(countdown(target, target, "Live"), "Live");
        assert_eq!(
            countdown(target, target - TimeDelta::days(3) - TimeDelta::minutes(1), "Live"),
            "3d 0h 1m"
        );
    }
}
