use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use pacesplits_parser::{FormatError, RawTable, SourceFormat};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditKind, AuditLog};
use crate::calendar::RaceCalendar;
use crate::merger::{merge, CanonicalDataset};
use crate::normalizer::{normalize_year, YearTable};

/// One year's raw export, already loaded.
#[derive(Debug, Clone)]
pub struct YearInput {
    pub year: i32,
    pub table: RawTable,
}

impl YearInput {
    pub fn new(year: i32, table: RawTable) -> Self {
        Self { year, table }
    }

    pub fn from_csv_path(year: i32, path: &Path) -> Result<Self, FormatError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Ok(Self::new(year, RawTable::from_csv_reader(file)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub format: SourceFormat,
    pub raw_rows: usize,
    pub records: usize,
    pub valid: usize,
    pub outliers: usize,
    pub rejected: usize,
    pub superseded: usize,
    pub filled: usize,
}

impl From<&YearTable> for YearSummary {
    fn from(table: &YearTable) -> Self {
        Self {
            year: table.year,
            format: table.format,
            raw_rows: table.raw_rows,
            records: table.records.len(),
            valid: table.valid_count(),
            outliers: table.outlier_count(),
            rejected: table.rejected,
            superseded: table.superseded,
            filled: table.filled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearFailure {
    pub year: i32,
    pub error: String,
}

/// Outcome of a whole run. Failed years are listed, never fatal.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub dataset: CanonicalDataset,
    pub years: Vec<YearSummary>,
    pub year_failures: Vec<YearFailure>,
    pub audit: AuditLog,
}

impl RunReport {
    /// Records a year that never reached normalization, e.g. an unreadable file.
    pub fn push_failure(&mut self, year: i32, error: impl ToString) {
        let error = error.to_string();
        warn!(year, error = %error, "Race year failed");
        self.audit
            .push(AuditEntry::new(year, AuditKind::YearFailure, error.clone()));
        self.year_failures.push(YearFailure { year, error });
        self.year_failures.sort_by_key(|f| f.year);
    }

    pub fn audit_counts(&self) -> BTreeMap<AuditKind, usize> {
        self.audit.counts()
    }
}

/// Normalizes every year in parallel, then merges in year order.
pub fn run(calendar: &RaceCalendar, inputs: Vec<YearInput>) -> RunReport {
    let mut outcomes: Vec<_> = inputs
        .par_iter()
        .map(|input| (input.year, normalize_year(calendar, input.year, &input.table)))
        .collect();
    outcomes.sort_by_key(|(year, _)| *year);

    let mut report = RunReport::default();
    let mut tables = Vec::new();

    for (year, outcome) in outcomes {
        match outcome {
            Ok(table) => {
                report.years.push(YearSummary::from(&table));
                report.audit.extend(table.audit.entries().iter().cloned());
                tables.push(table);
            }
            Err(err) => report.push_failure(year, err),
        }
    }

    report.dataset = merge(&tables);
    info!(
        years = report.years.len(),
        failed = report.year_failures.len(),
        records = report.dataset.len(),
        "Merged canonical dataset"
    );
    report
}
