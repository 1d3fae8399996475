use crate::errors::FormatError;
use crate::model::{RaceAnchor, RawRow, RowOutcome, SourceFormat, SplitReading};
use crate::registry::SplitParser;

use super::common::{bind_columns, read_identity, read_time_field, ColumnLayout, ColumnRole};

/// Years with both check-in and check-out readings. Each side is parsed on its
/// own so a bad check-out never spoils a good check-in.
pub struct FullSplitParser;

impl Default for FullSplitParser {
    fn default() -> Self {
        Self
    }
}

impl FullSplitParser {
    const NAME: &'static str = "FULL_SPLIT";

    const USED: &'static [ColumnRole] = &[
        ColumnRole::Bib,
        ColumnRole::Station,
        ColumnRole::CheckIn,
        ColumnRole::CheckInElapsed,
        ColumnRole::CheckOut,
        ColumnRole::CheckOutElapsed,
    ];

    const REQUIRED: &'static [ColumnRole] =
        &[ColumnRole::Bib, ColumnRole::Station, ColumnRole::CheckIn];
}

impl SplitParser for FullSplitParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::FullSplit
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
            ColumnRole::CheckIn,
            Some(ColumnRole::CheckInElapsed),
            anchor,
        );
        let check_out = read_time_field(
            layout,
            row,
            ColumnRole::CheckOut,
            Some(ColumnRole::CheckOutElapsed),
            anchor,
        );

        RowOutcome::Read(SplitReading {
            line_index: row.line_index,
            bib,
            station,
            check_in,
            check_out,
        })
    }
}
