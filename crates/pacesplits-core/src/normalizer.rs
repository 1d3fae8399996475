//! Turns one year's raw table into canonical checkpoint records.
//!
//! Only structurally broken rows (no bib, no station, ragged) are dropped.
//! Every value-level problem keeps the row with `valid = false` and a reason,
//! so a year's output can always be reconciled against its input.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use pacesplits_parser::{
    read_table, FieldReading, FormatError, RawTable, SourceFormat, SplitReading, TimeSource,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditKind, AuditLog};
use crate::calendar::{CalendarError, RaceCalendar, RaceYearConfig};
use crate::progression::check_progression;
use crate::record::{self, canonical_order, CheckpointRecord};
use crate::stations::Course;

#[derive(Debug, Error)]
pub enum YearError {
    #[error(transparent)]
    UnknownYear(#[from] CalendarError),
    #[error("year {year}: {source}")]
    Format {
        year: i32,
        #[source]
        source: FormatError,
    },
}

/// Canonical rows for one year plus the bookkeeping needed to reconcile them
/// with the raw input.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub year: i32,
    pub format: SourceFormat,
    pub raw_rows: usize,
    pub records: Vec<CheckpointRecord>,
    pub audit: AuditLog,
    /// Rows dropped for structural reasons.
    pub rejected: usize,
    /// Earlier rows replaced by a later row with the same (bib, station).
    pub superseded: usize,
    /// Explicit `missing checkpoint` rows added for absent stations.
    pub filled: usize,
}

impl YearTable {
    pub fn valid_count(&self) -> usize {
        self.records.iter().filter(|r| r.valid).count()
    }

    pub fn outlier_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_outlier).count()
    }
}

pub fn normalize_year(
    calendar: &RaceCalendar,
    year: i32,
    table: &RawTable,
) -> Result<YearTable, YearError> {
    let config = calendar.year(year)?;
    let course = calendar.course(year)?;
    let anchor = config.anchor();

    let reading = read_table(config.format, table, &anchor)
        .map_err(|source| YearError::Format { year, source })?;

    let mut audit = AuditLog::default();
    for rejection in &reading.rejections {
        audit.push(
            AuditEntry::new(year, AuditKind::StructuralRejection, rejection.reason.to_string())
                .at_line(rejection.line_index),
        );
    }
    if !reading.rejections.is_empty() {
        warn!(
            year,
            rejected = reading.rejections.len(),
            "Dropped structurally invalid rows"
        );
    }

    let mut slots: Vec<Option<CheckpointRecord>> = Vec::with_capacity(reading.readings.len());
    let mut seen: HashMap<(String, String), (usize, usize)> = HashMap::new();
    let mut superseded = 0;

    for split in &reading.readings {
        let record = build_record(config, course, split, &mut audit);
        let key = (record.bib.clone(), record.station_id.clone());
        let slot = slots.len();

        if let Some((earlier_slot, earlier_line)) = seen.insert(key, (slot, split.line_index)) {
            slots[earlier_slot] = None;
            superseded += 1;
            debug!(
                year,
                bib = %record.bib,
                station = %record.station_id,
                kept_line = split.line_index,
                dropped_line = earlier_line,
                "Duplicate checkpoint replaced"
            );
            audit.push(
                AuditEntry::new(
                    year,
                    AuditKind::DuplicateKeyConflict,
                    format!("line {earlier_line} superseded by line {}", split.line_index),
                )
                .at_line(earlier_line)
                .for_runner(&record.bib, &record.station_id),
            );
        }
        slots.push(Some(record));
    }

    let mut records: Vec<CheckpointRecord> = slots.into_iter().flatten().collect();
    records.sort_by(canonical_order);

    audit.extend(check_progression(year, &records));

    let mut filled = 0;
    if calendar.fill_missing_stations() && !course.is_empty() {
        let missing = missing_checkpoints(year, config.format, course, &records);
        filled = missing.len();
        for row in &missing {
            audit.push(
                AuditEntry::new(year, AuditKind::MissingCheckpoint, "no reading at course station")
                    .for_runner(&row.bib, &row.station_id),
            );
        }
        records.extend(missing);
        records.sort_by(canonical_order);
    }

    let table = YearTable {
        year,
        format: config.format,
        raw_rows: table.len(),
        records,
        audit,
        rejected: reading.rejections.len(),
        superseded,
        filled,
    };

    info!(
        year,
        format = %table.format,
        raw_rows = table.raw_rows,
        records = table.records.len(),
        valid = table.valid_count(),
        outliers = table.outlier_count(),
        superseded = table.superseded,
        "Normalized race year"
    );

    Ok(table)
}

fn build_record(
    config: &RaceYearConfig,
    course: &Course,
    split: &SplitReading,
    audit: &mut AuditLog,
) -> CheckpointRecord {
    let year = config.year;
    let mut reasons: Vec<&'static str> = Vec::new();
    let entry = |kind: AuditKind, detail: String| {
        AuditEntry::new(year, kind, detail)
            .at_line(split.line_index)
            .for_runner(&split.bib, &split.station)
    };

    let (station_id, station_order) = match course.resolve(&split.station) {
        Some((id, order)) => (id, Some(order)),
        None => {
            audit.push(entry(
                AuditKind::UnknownStation,
                format!("station '{}' is not on the {year} course", split.station),
            ));
            (split.station.trim().to_string(), None)
        }
    };

    let note_elapsed = |audit: &mut AuditLog, field: &str, source: TimeSource, at: NaiveDateTime| {
        if source == TimeSource::Elapsed {
            audit.push(entry(
                AuditKind::ElapsedFallback,
                format!("{field} {at} derived from elapsed time"),
            ));
        }
    };

    let check_in = match &split.check_in {
        FieldReading::Parsed { at, source } => {
            note_elapsed(audit, "check_in", *source, *at);
            Some(*at)
        }
        FieldReading::Missing => {
            reasons.push(record::MISSING_TIME);
            None
        }
        FieldReading::Failed(err) => {
            reasons.push(record::UNPARSEABLE_TIME);
            audit.push(entry(AuditKind::FieldParseError, format!("check_in: {err}")));
            None
        }
    };

    let check_out = match config.format {
        SourceFormat::TimeInOnly => None,
        SourceFormat::FullSplit => match &split.check_out {
            FieldReading::Parsed { at, source } => {
                note_elapsed(audit, "check_out", *source, *at);
                Some(*at)
            }
            FieldReading::Missing => None,
            FieldReading::Failed(err) => {
                audit.push(entry(AuditKind::FieldParseError, format!("check_out: {err}")));
                None
            }
        },
    };

    if let (Some(arrived), Some(left)) = (check_in, check_out) {
        if left < arrived {
            reasons.push(record::CHECK_OUT_BEFORE_CHECK_IN);
            audit.push(entry(
                AuditKind::CrossFieldViolation,
                format!("check_out {left} is before check_in {arrived}"),
            ));
        }
    }

    let start = config.race_start();
    let cutoff = config.cutoff();
    let stamps: Vec<NaiveDateTime> = check_in.into_iter().chain(check_out).collect();

    if let Some(early) = stamps.iter().find(|at| **at < start) {
        reasons.push(record::BEFORE_RACE_START);
        audit.push(entry(
            AuditKind::BeforeRaceStart,
            format!("{early} is before the race start {start}"),
        ));
    }

    let is_outlier = match stamps.iter().find(|at| **at > cutoff) {
        Some(late) => {
            audit.push(entry(
                AuditKind::OutlierDuration,
                format!(
                    "{late} is more than {} hours after the start",
                    config.max_elapsed_hours
                ),
            ));
            true
        }
        None => false,
    };

    if station_order.is_none() {
        reasons.push(record::UNKNOWN_STATION);
    }

    let valid = reasons.is_empty();
    CheckpointRecord {
        year,
        bib: split.bib.clone(),
        station_id,
        station_order,
        check_in,
        check_out,
        source_format: config.format,
        valid,
        invalid_reason: (!valid).then(|| reasons.join("|")),
        is_outlier,
    }
}

fn missing_checkpoints(
    year: i32,
    format: SourceFormat,
    course: &Course,
    records: &[CheckpointRecord],
) -> Vec<CheckpointRecord> {
    let mut present: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut bibs: Vec<&str> = Vec::new();
    for record in records {
        let stations = present.entry(record.bib.as_str()).or_insert_with(|| {
            bibs.push(record.bib.as_str());
            BTreeSet::new()
        });
        stations.insert(record.station_id.as_str());
    }

    let mut missing = Vec::new();
    for bib in bibs {
        let stations = &present[bib];
        for station in course.stations() {
            if !stations.contains(station.id.as_str()) {
                missing.push(CheckpointRecord::missing_checkpoint(
                    year,
                    bib,
                    &station.id,
                    station.order,
                    format,
                ));
            }
        }
    }
    missing
}
