use crate::errors::FormatError;
use crate::model::{FieldReading, RaceAnchor, RawRow, RowOutcome, SourceFormat, SplitReading};
use crate::registry::SplitParser;

use super::common::{bind_columns, read_identity, read_time_field, ColumnLayout, ColumnRole};

/// Years scraped from the live-results site: arrival time-of-day only.
pub struct TimeInOnlyParser;

impl Default for TimeInOnlyParser {
    fn default() -> Self {
        Self
    }
}

impl TimeInOnlyParser {
    const NAME: &'static str = "TIME_IN_ONLY";

    const USED: &'static [ColumnRole] = &[
        ColumnRole::Bib,
        ColumnRole::Station,
        ColumnRole::TimeIn,
        ColumnRole::TimeInElapsed,
    ];

    const REQUIRED: &'static [ColumnRole] =
        &[ColumnRole::Bib, ColumnRole::Station, ColumnRole::TimeIn];
}

impl SplitParser for TimeInOnlyParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::TimeInOnly
    }

    fn bind(&self, columns: &[String]) -> Result<ColumnLayout, FormatError> {
        bind_columns(Self::NAME, columns, Self::USED, Self::REQUIRED)
    }

    fn read_row(&self, layout: &ColumnLayout, row: &RawRow, anchor: &RaceAnchor) -> RowOutcome {
        let (bib, station) = match read_identity(layout, row) {
            Ok(identity) => identity,
            Err(rejection) => return RowOutcome::Rejected(rejection),
        };

        let check_in = read_time_field(
            layout,
            row,
            ColumnRole::TimeIn,
            Some(ColumnRole::TimeInElapsed),
            anchor,
        );

        RowOutcome::Read(SplitReading {
            line_index: row.line_index,
            bib,
            station,
            check_in,
            // no departure was ever recorded for these years, whatever the export carries
            check_out: FieldReading::Missing,
        })
    }
}
