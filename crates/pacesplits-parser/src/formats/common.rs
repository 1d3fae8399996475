use std::collections::HashMap;

use crate::errors::FormatError;
use crate::model::{
    FieldReading, RaceAnchor, RawRow, RejectionReason, RowRejection, TimeSource,
};
use crate::time::{elapsed_to_timestamp, parse_time_of_day};

use super::schema::{aliases, ALL_ROLES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Bib,
    Station,
    TimeIn,
    TimeInElapsed,
    CheckIn,
    CheckInElapsed,
    CheckOut,
    CheckOutElapsed,
}

impl ColumnRole {
    pub fn canonical_name(&self) -> &'static str {
        aliases(*self)[0]
    }
}

pub(crate) fn classify_column(name: &str) -> Option<ColumnRole> {
    let lower = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    ALL_ROLES
        .iter()
        .copied()
        .find(|role| aliases(*role).contains(&lower.as_str()))
}

/// Header positions for the roles a format cares about, resolved once per table.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    positions: HashMap<ColumnRole, usize>,
    width: usize,
}

impl ColumnLayout {
    pub fn position(&self, role: ColumnRole) -> Option<usize> {
        self.positions.get(&role).copied()
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.positions.contains_key(&role)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    fn value<'a>(&self, row: &'a RawRow, role: ColumnRole) -> Option<&'a str> {
        self.position(role).and_then(|idx| row.get(idx))
    }
}

/// Maps header names to roles. Columns the format does not use are ignored;
/// a role matched by two headers is ambiguous and rejected.
pub(crate) fn bind_columns(
    parser: &'static str,
    columns: &[String],
    used: &[ColumnRole],
    required: &[ColumnRole],
) -> Result<ColumnLayout, FormatError> {
    let mut positions = HashMap::new();
    for (idx, name) in columns.iter().enumerate() {
        let Some(role) = classify_column(name) else {
            continue;
        };
        if !used.contains(&role) {
            continue;
        }
        if positions.insert(role, idx).is_some() {
            return Err(FormatError::DuplicateColumn {
                parser,
                column: name.clone(),
            });
        }
    }

    let missing: Vec<&'static str> = required
        .iter()
        .filter(|role| !positions.contains_key(role))
        .map(|role| role.canonical_name())
        .collect();
    if !missing.is_empty() {
        return Err(FormatError::SchemaMismatch { parser, missing });
    }

    Ok(ColumnLayout {
        positions,
        width: columns.len(),
    })
}

/// Structural check: a row needs a bib and a station to be worth emitting.
pub(crate) fn read_identity(
    layout: &ColumnLayout,
    row: &RawRow,
) -> Result<(String, String), RowRejection> {
    let reject = |reason| RowRejection {
        line_index: row.line_index,
        reason,
    };

    // trailing empty cells (`104,AS5,14:32,`) are padding, not data
    let overflow = row.values.get(layout.width()..).unwrap_or_default();
    if overflow.iter().any(Option::is_some) {
        return Err(reject(RejectionReason::RaggedRow {
            expected: layout.width(),
            found: row.values.len(),
        }));
    }

    let bib = layout
        .value(row, ColumnRole::Bib)
        .ok_or_else(|| reject(RejectionReason::MissingBib))?;
    let station = layout
        .value(row, ColumnRole::Station)
        .ok_or_else(|| reject(RejectionReason::MissingStation))?;

    Ok((bib.to_string(), station.to_string()))
}

/// Reads one time field. The time-of-day column wins when it has a value; the
/// elapsed column only fills blanks.
pub(crate) fn read_time_field(
    layout: &ColumnLayout,
    row: &RawRow,
    time_of_day: ColumnRole,
    elapsed: Option<ColumnRole>,
    anchor: &RaceAnchor,
) -> FieldReading {
    if let Some(raw) = layout.value(row, time_of_day) {
        return match parse_time_of_day(raw, anchor) {
            Ok(at) => FieldReading::Parsed {
                at,
                source: TimeSource::TimeOfDay,
            },
            Err(err) => FieldReading::Failed(err),
        };
    }

    match elapsed.and_then(|role| layout.value(row, role)) {
        Some(raw) => match elapsed_to_timestamp(raw, anchor.start()) {
            Ok(at) => FieldReading::Parsed {
                at,
                source: TimeSource::Elapsed,
            },
            Err(err) => FieldReading::Failed(err),
        },
        None => FieldReading::Missing,
    }
}
