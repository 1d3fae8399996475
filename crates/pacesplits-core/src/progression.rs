use chrono::NaiveDateTime;

use crate::audit::{AuditEntry, AuditKind};
use crate::record::CheckpointRecord;

/// Reports runners whose arrival times go backwards along the course.
///
/// `records` must be in canonical order. Rows without a course position or a
/// check-in are skipped; nothing is modified.
pub fn check_progression(year: i32, records: &[CheckpointRecord]) -> Vec<AuditEntry> {
    let mut entries = Vec::new();
    let mut previous: Option<(&str, &str, NaiveDateTime)> = None;

    for record in records.iter().filter(|r| r.year == year) {
        if let Some((bib, _, _)) = previous {
            if bib != record.bib {
                previous = None;
            }
        }

        let (Some(_), Some(check_in)) = (record.station_order, record.check_in) else {
            continue;
        };

        if let Some((_, prior_station, prior_check_in)) = previous {
            if check_in < prior_check_in {
                entries.push(
                    AuditEntry::new(
                        year,
                        AuditKind::NonMonotonicProgression,
                        format!("check_in {check_in} precedes {prior_check_in} at {prior_station}"),
                    )
                    .for_runner(&record.bib, &record.station_id),
                );
            }
        }

        previous = Some((record.bib.as_str(), record.station_id.as_str(), check_in));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pacesplits_parser::SourceFormat;

    fn record(bib: &str, order: u32, hour: u32) -> CheckpointRecord {
        CheckpointRecord {
            year: 2022,
            bib: bib.to_string(),
            station_id: format!("AS{order}"),
            station_order: Some(order),
            check_in: NaiveDate::from_ymd_opt(2022, 8, 13).and_then(|d| d.and_hms_opt(hour, 0, 0)),
            check_out: None,
            source_format: SourceFormat::FullSplit,
            valid: true,
            invalid_reason: None,
            is_outlier: false,
        }
    }

    #[test]
    fn flags_backwards_arrivals_only_within_a_runner() {
        let records = vec![
            record("1", 1, 6),
            record("1", 2, 9),
            record("1", 3, 8),
            record("1", 4, 10),
            record("2", 1, 7),
        ];

        let entries = check_progression(2022, &records);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bib.as_deref(), Some("1"));
        assert_eq!(entries[0].station.as_deref(), Some("AS3"));
    }

    #[test]
    fn rows_without_check_in_are_skipped() {
        let mut gap = record("1", 2, 0);
        gap.check_in = None;
        let records = vec![record("1", 1, 6), gap, record("1", 3, 7)];
        assert!(check_progression(2022, &records).is_empty());
    }
}
