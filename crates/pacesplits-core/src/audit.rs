use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

/// What an audit entry records. Only `StructuralRejection` removes a row from
/// the canonical output; everything else is a flag on a retained row, or a
/// year-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    YearFailure,
    StructuralRejection,
    FieldParseError,
    ElapsedFallback,
    CrossFieldViolation,
    BeforeRaceStart,
    OutlierDuration,
    UnknownStation,
    DuplicateKeyConflict,
    NonMonotonicProgression,
    MissingCheckpoint,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::YearFailure => "year_failure",
            AuditKind::StructuralRejection => "structural_rejection",
            AuditKind::FieldParseError => "field_parse_error",
            AuditKind::ElapsedFallback => "elapsed_fallback",
            AuditKind::CrossFieldViolation => "cross_field_violation",
            AuditKind::BeforeRaceStart => "before_race_start",
            AuditKind::OutlierDuration => "outlier_duration",
            AuditKind::UnknownStation => "unknown_station",
            AuditKind::DuplicateKeyConflict => "duplicate_key_conflict",
            AuditKind::NonMonotonicProgression => "non_monotonic_progression",
            AuditKind::MissingCheckpoint => "missing_checkpoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub year: i32,
    pub line_index: Option<usize>,
    pub bib: Option<String>,
    pub station: Option<String>,
    pub kind: AuditKind,
    pub detail: String,
}

impl AuditEntry {
    pub fn new(year: i32, kind: AuditKind, detail: impl Into<String>) -> Self {
        Self {
            year,
            line_index: None,
            bib: None,
            station: None,
            kind,
            detail: detail.into(),
        }
    }

    pub fn at_line(mut self, line_index: usize) -> Self {
        self.line_index = Some(line_index);
        self
    }

    pub fn for_runner(mut self, bib: &str, station: &str) -> Self {
        self.bib = Some(bib.to_string());
        self.station = Some(station.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn push(&mut self, entry: AuditEntry) {
        self.entries.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = AuditEntry>) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: AuditKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn counts(&self) -> BTreeMap<AuditKind, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_insert(0) += 1;
        }
        counts
    }

    /// First `per_kind` entries of every kind, in log order.
    pub fn sample(&self, per_kind: usize) -> Vec<&AuditEntry> {
        let mut taken: BTreeMap<AuditKind, usize> = BTreeMap::new();
        self.entries
            .iter()
            .filter(|entry| {
                let seen = taken.entry(entry.kind).or_insert(0);
                *seen += 1;
                *seen <= per_kind
            })
            .collect()
    }

    /// One JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> Result<(), serde_json::Error> {
        for entry in &self.entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n").map_err(serde_json::Error::io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> AuditLog {
        let mut log = AuditLog::default();
        for line in 2..6 {
            log.push(
                AuditEntry::new(2021, AuditKind::FieldParseError, "check_in: unparseable time")
                    .at_line(line),
            );
        }
        log.push(AuditEntry::new(2016, AuditKind::YearFailure, "schema mismatch"));
        log
    }

    #[test]
    fn counts_and_samples_by_kind() {
        let log = log();
        assert_eq!(log.count(AuditKind::FieldParseError), 4);
        assert_eq!(log.counts().get(&AuditKind::YearFailure), Some(&1));

        let sample = log.sample(2);
        assert_eq!(sample.len(), 3);
        assert_eq!(sample[1].line_index, Some(3));
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let mut buffer = Vec::new();
        log().write_jsonl(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "field_parse_error");
        assert_eq!(first["line_index"], 2);
    }
}
