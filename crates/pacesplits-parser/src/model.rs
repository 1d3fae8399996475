use std::fmt;
use std::io::Read;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::{FormatError, TimeParseError};

/// Layout a race year's timing export was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Arrival time-of-day only; no departure reading exists.
    TimeInOnly,
    /// Check-in and check-out time-of-day per station.
    FullSplit,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::TimeInOnly => "time_in_only",
            SourceFormat::FullSplit => "full_split",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Race date and wall-clock start that every time cell of a year is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaceAnchor {
    pub race_date: NaiveDate,
    pub start_time: NaiveTime,
}

impl RaceAnchor {
    pub fn new(race_date: NaiveDate, start_time: NaiveTime) -> Self {
        Self {
            race_date,
            start_time,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.race_date.and_time(self.start_time)
    }

    pub fn elapsed_since_start(&self, at: NaiveDateTime) -> Duration {
        at - self.start()
    }
}

/// Untyped table handed over by a loader: header names plus text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line in the source, header is line 1.
    pub line_index: usize,
    pub values: Vec<Option<String>>,
}

impl RawRow {
    pub fn new(line_index: usize, values: Vec<Option<String>>) -> Self {
        Self { line_index, values }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row of cells; blank cells become nulls.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let line_index = self.rows.len() + 2;
        let values = cells.into_iter().map(|c| clean_cell(c.as_ref())).collect();
        self.rows.push(RawRow::new(line_index, values));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FormatError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = reader.records();
        let header = records.next().ok_or(FormatError::MissingHeader)??;
        let mut table = RawTable::new(header.iter().map(|c| c.to_string()).collect());

        for record in records {
            let record = record?;
            let line_index = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(table.rows.len() + 2);
            let values = record.iter().map(clean_cell).collect();
            table.rows.push(RawRow::new(line_index, values));
        }

        Ok(table)
    }

    pub fn from_csv_str(content: &str) -> Result<Self, FormatError> {
        Self::from_csv_reader(content.as_bytes())
    }
}

fn clean_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let is_null = trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("na");
    if is_null {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// How a field's timestamp was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    TimeOfDay,
    Elapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReading {
    /// No value in any column feeding this field.
    Missing,
    Parsed {
        at: NaiveDateTime,
        source: TimeSource,
    },
    Failed(TimeParseError),
}

impl FieldReading {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldReading::Parsed { at, .. } => Some(*at),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&TimeParseError> {
        match self {
            FieldReading::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// One structurally sound row with its time fields resolved independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReading {
    pub line_index: usize,
    pub bib: String,
    pub station: String,
    pub check_in: FieldReading,
    pub check_out: FieldReading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RejectionReason {
    MissingBib,
    MissingStation,
    RaggedRow { expected: usize, found: usize },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::MissingBib => f.write_str("missing bib"),
            RejectionReason::MissingStation => f.write_str("missing station"),
            RejectionReason::RaggedRow { expected, found } => {
                write!(f, "row has {found} fields, header has {expected}")
            }
        }
    }
}

/// A row dropped before any time parsing because it carries no usable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub line_index: usize,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Read(SplitReading),
    Rejected(RowRejection),
}
