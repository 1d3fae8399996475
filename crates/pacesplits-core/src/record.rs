use std::cmp::Ordering;

use chrono::NaiveDateTime;
use pacesplits_parser::SourceFormat;
use serde::Serialize;

pub const UNPARSEABLE_TIME: &str = "unparseable time";
pub const MISSING_TIME: &str = "missing time";
pub const CHECK_OUT_BEFORE_CHECK_IN: &str = "check_out before check_in";
pub const BEFORE_RACE_START: &str = "before race start";
pub const UNKNOWN_STATION: &str = "unknown station";
pub const MISSING_CHECKPOINT: &str = "missing checkpoint";

/// One runner at one station in one year. Field order is the canonical
/// column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointRecord {
    pub year: i32,
    pub bib: String,
    pub station_id: String,
    /// `None` when the station is not on that year's course.
    pub station_order: Option<u32>,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub source_format: SourceFormat,
    pub valid: bool,
    pub invalid_reason: Option<String>,
    pub is_outlier: bool,
}

impl CheckpointRecord {
    /// Explicit null row for a course station a present runner has no reading at.
    pub fn missing_checkpoint(
        year: i32,
        bib: &str,
        station_id: &str,
        station_order: u32,
        source_format: SourceFormat,
    ) -> Self {
        Self {
            year,
            bib: bib.to_string(),
            station_id: station_id.to_string(),
            station_order: Some(station_order),
            check_in: None,
            check_out: None,
            source_format,
            valid: false,
            invalid_reason: Some(MISSING_CHECKPOINT.to_string()),
            is_outlier: false,
        }
    }

    pub fn is_missing_checkpoint(&self) -> bool {
        self.invalid_reason.as_deref() == Some(MISSING_CHECKPOINT)
    }
}

/// Sort key for bibs: numeric bibs in numeric order, then anything else
/// lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BibKey<'a> {
    Numeric(u64),
    Text(&'a str),
}

impl<'a> BibKey<'a> {
    pub fn of(bib: &'a str) -> Self {
        match bib.parse::<u64>() {
            Ok(n) => BibKey::Numeric(n),
            Err(_) => BibKey::Text(bib),
        }
    }
}

/// Total order used for every canonical table: year, bib, course position
/// (unknown stations last), station id, then line-independent tie breakers.
pub fn canonical_order(a: &CheckpointRecord, b: &CheckpointRecord) -> Ordering {
    a.year
        .cmp(&b.year)
        .then_with(|| BibKey::of(&a.bib).cmp(&BibKey::of(&b.bib)))
        .then_with(|| a.bib.cmp(&b.bib))
        .then_with(|| {
            let ao = a.station_order.unwrap_or(u32::MAX);
            let bo = b.station_order.unwrap_or(u32::MAX);
            ao.cmp(&bo)
        })
        .then_with(|| a.station_id.cmp(&b.station_id))
        .then_with(|| a.check_in.cmp(&b.check_in))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, bib: &str, station: &str, order: Option<u32>) -> CheckpointRecord {
        CheckpointRecord {
            year,
            bib: bib.to_string(),
            station_id: station.to_string(),
            station_order: order,
            check_in: None,
            check_out: None,
            source_format: SourceFormat::FullSplit,
            valid: true,
            invalid_reason: None,
            is_outlier: false,
        }
    }

    #[test]
    fn bibs_sort_numerically_before_text() {
        let mut bibs = vec!["104", "23", "A7", "7", "007"];
        bibs.sort_by(|a, b| BibKey::of(a).cmp(&BibKey::of(b)).then_with(|| a.cmp(b)));
        assert_eq!(bibs, vec!["007", "7", "23", "104", "A7"]);
    }

    #[test]
    fn unknown_stations_sort_last_within_runner() {
        let mut rows = vec![
            record(2021, "7", "??", None),
            record(2021, "7", "AS9", Some(9)),
            record(2016, "7", "AS1", Some(1)),
            record(2021, "7", "AS10", Some(10)),
        ];
        rows.sort_by(canonical_order);
        let ids: Vec<&str> = rows.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["AS1", "AS9", "AS10", "??"]);
    }
}
