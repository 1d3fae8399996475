//! Time cell parsing.
//!
//! Two kinds of cells show up in split exports: wall-clock time-of-day
//! (`14:32`, `02:15:00`) which has to be anchored to the race date, and
//! elapsed durations since the gun (`30:15:00`) whose hour field routinely
//! runs past 23.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::errors::TimeParseError;
use crate::model::RaceAnchor;

/// Clock components of a parsed cell. `micros` is the fractional second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Components {
    hours: u64,
    minutes: u32,
    seconds: u32,
    micros: u32,
}

/// Resolves a time-of-day cell to an absolute timestamp.
///
/// Times strictly earlier than the start time are taken to be after midnight
/// and land on the following calendar day. A time equal to the start time
/// belongs to the start day.
pub fn parse_time_of_day(raw: &str, anchor: &RaceAnchor) -> Result<NaiveDateTime, TimeParseError> {
    let time = parse_clock(raw)?;
    let candidate = anchor.race_date.and_time(time);
    if time < anchor.start_time {
        Ok(candidate + Duration::days(1))
    } else {
        Ok(candidate)
    }
}

/// Parses a bare wall-clock value (`H:MM`, `HH:MM:SS`, `HH:MM:SS.fff`).
///
/// A leading `YYYY-MM-DD ` date is tolerated and discarded; some vendor exports
/// stamp every time-of-day with a placeholder date.
pub fn parse_clock(raw: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = raw.trim();
    let clock = strip_date_prefix(trimmed);
    let parts = split_components(trimmed, clock, true)?;

    if parts.hours > 23 {
        return Err(out_of_range(trimmed, "hour"));
    }
    check_sexagesimal(trimmed, &parts)?;

    NaiveTime::from_hms_micro_opt(parts.hours as u32, parts.minutes, parts.seconds, parts.micros)
        .ok_or_else(|| malformed(trimmed))
}

/// Parses an elapsed duration `H+:MM:SS(.fff)`. Hours are unbounded.
pub fn parse_elapsed(raw: &str) -> Result<Duration, TimeParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return Err(TimeParseError::Negative {
            raw: trimmed.to_string(),
        });
    }
    let parts = split_components(trimmed, trimmed, false)?;
    check_sexagesimal(trimmed, &parts)?;

    let hours = i64::try_from(parts.hours).map_err(|_| out_of_range(trimmed, "hour"))?;
    Duration::try_hours(hours)
        .and_then(|d| d.checked_add(&Duration::minutes(i64::from(parts.minutes))))
        .and_then(|d| d.checked_add(&Duration::seconds(i64::from(parts.seconds))))
        .and_then(|d| d.checked_add(&Duration::microseconds(i64::from(parts.micros))))
        .ok_or_else(|| out_of_range(trimmed, "hour"))
}

/// Offsets the race start by an elapsed cell. No rollover applies: the value is
/// a duration, not a wall-clock reading.
pub fn elapsed_to_timestamp(
    raw: &str,
    start: NaiveDateTime,
) -> Result<NaiveDateTime, TimeParseError> {
    let elapsed = parse_elapsed(raw)?;
    start
        .checked_add_signed(elapsed)
        .ok_or_else(|| out_of_range(raw.trim(), "hour"))
}

fn strip_date_prefix(value: &str) -> &str {
    match value.split_once([' ', 'T']) {
        Some((date, rest)) if looks_like_date(date) => rest.trim(),
        _ => value,
    }
}

fn looks_like_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit())
}

fn split_components(
    raw: &str,
    value: &str,
    seconds_optional: bool,
) -> Result<Components, TimeParseError> {
    let fields: Vec<&str> = value.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [h, m] if seconds_optional => (*h, *m, None),
        [h, m, s] => (*h, *m, Some(*s)),
        _ => return Err(malformed(raw)),
    };

    let hours = parse_digits(raw, hours, if seconds_optional { Some(2) } else { None })?;
    let minutes = parse_fixed_two(raw, minutes)?;
    let (seconds, micros) = match seconds {
        Some(s) => parse_seconds(raw, s)?,
        None => (0, 0),
    };

    Ok(Components {
        hours,
        minutes,
        seconds,
        micros,
    })
}

fn parse_digits(raw: &str, field: &str, max_len: Option<usize>) -> Result<u64, TimeParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(raw));
    }
    if max_len.is_some_and(|max| field.len() > max) {
        return Err(malformed(raw));
    }
    field.parse::<u64>().map_err(|_| malformed(raw))
}

fn parse_fixed_two(raw: &str, field: &str) -> Result<u32, TimeParseError> {
    if field.len() != 2 {
        return Err(malformed(raw));
    }
    parse_digits(raw, field, Some(2)).map(|v| v as u32)
}

fn parse_seconds(raw: &str, field: &str) -> Result<(u32, u32), TimeParseError> {
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (field, None),
    };
    let seconds = parse_fixed_two(raw, whole)?;
    let micros = match fraction {
        None => 0,
        Some(frac) => {
            if frac.is_empty() || frac.len() > 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(raw));
            }
            let padded = format!("{frac:0<6}");
            padded.parse::<u32>().map_err(|_| malformed(raw))?
        }
    };
    Ok((seconds, micros))
}

fn check_sexagesimal(raw: &str, parts: &Components) -> Result<(), TimeParseError> {
    if parts.minutes > 59 {
        return Err(out_of_range(raw, "minute"));
    }
    if parts.seconds > 59 {
        return Err(out_of_range(raw, "second"));
    }
    Ok(())
}

fn malformed(raw: &str) -> TimeParseError {
    TimeParseError::Malformed {
        raw: raw.to_string(),
    }
}

fn out_of_range(raw: &str, component: &'static str) -> TimeParseError {
    TimeParseError::OutOfRange {
        raw: raw.to_string(),
        component,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn anchor() -> RaceAnchor {
        RaceAnchor::new(
            NaiveDate::from_ymd_opt(2021, 8, 14).unwrap(),
            NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
        )
    }

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn time_before_start_rolls_to_next_day() {
        let parsed = parse_time_of_day("02:15:00", &anchor()).unwrap();
        assert_eq!(parsed, ts("2021-08-15 02:15:00"));
    }

    #[test]
    fn time_equal_to_start_stays_on_race_day() {
        let parsed = parse_time_of_day("05:00", &anchor()).unwrap();
        assert_eq!(parsed, ts("2021-08-14 05:00:00"));
    }

    #[test]
    fn afternoon_time_stays_on_race_day() {
        let parsed = parse_time_of_day("14:32", &anchor()).unwrap();
        assert_eq!(parsed, ts("2021-08-14 14:32:00"));
    }

    #[test]
    fn single_digit_hour_is_accepted() {
        let parsed = parse_time_of_day("7:05", &anchor()).unwrap();
        assert_eq!(parsed, ts("2021-08-14 07:05:00"));
    }

    #[test]
    fn vendor_date_prefix_is_discarded() {
        let parsed = parse_time_of_day("1900-01-01 03:10:00", &anchor()).unwrap();
        assert_eq!(parsed, ts("2021-08-15 03:10:00"));
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let parsed = parse_clock("10:00:01.25").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_micro_opt(10, 0, 1, 250_000).unwrap());
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        assert!(matches!(
            parse_clock("25:00"),
            Err(TimeParseError::OutOfRange { component: "hour", .. })
        ));
        assert!(matches!(
            parse_clock("12:60"),
            Err(TimeParseError::OutOfRange { component: "minute", .. })
        ));
        assert!(matches!(
            parse_clock("12:00:60"),
            Err(TimeParseError::OutOfRange { component: "second", .. })
        ));
    }

    #[test]
    fn malformed_clock_values_are_rejected() {
        for raw in ["", "1432", "14:3", "ab:cd", "14:32:00:00", "14:32:", "DNF", "123:00"] {
            assert!(
                matches!(parse_clock(raw), Err(TimeParseError::Malformed { .. })),
                "expected '{raw}' to be malformed"
            );
        }
    }

    #[test]
    fn elapsed_spanning_days_is_added_exactly() {
        let start = anchor().start();
        let at = elapsed_to_timestamp("30:15:00", start).unwrap();
        assert_eq!(at, ts("2021-08-15 11:15:00"));

        let at = elapsed_to_timestamp("52:01:09", start).unwrap();
        assert_eq!(at, ts("2021-08-16 09:01:09"));
    }

    #[test]
    fn elapsed_requires_seconds() {
        assert!(matches!(
            parse_elapsed("30:15"),
            Err(TimeParseError::Malformed { .. })
        ));
    }

    #[test]
    fn negative_elapsed_is_rejected() {
        assert_eq!(
            parse_elapsed("-01:00:00"),
            Err(TimeParseError::Negative {
                raw: "-01:00:00".to_string()
            })
        );
    }
}
