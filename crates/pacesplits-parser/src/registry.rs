use crate::errors::FormatError;
use crate::formats::{ColumnLayout, FullSplitParser, TimeInOnlyParser};
use crate::model::{
    RaceAnchor, RawRow, RawTable, RowOutcome, RowRejection, SourceFormat, SplitReading,
};

pub trait SplitParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn format(&self) -> SourceFormat;
    fn bind(&self, columns: &[String]) -> Result<ColumnLayout, FormatError>;
    fn read_row(&self, layout: &ColumnLayout, row: &RawRow, anchor: &RaceAnchor) -> RowOutcome;
}

static TIME_IN_ONLY: TimeInOnlyParser = TimeInOnlyParser;
static FULL_SPLIT: FullSplitParser = FullSplitParser;

/// The reader for a declared year format. Chosen once per table, never per row.
pub fn parser_for(format: SourceFormat) -> &'static dyn SplitParser {
    match format {
        SourceFormat::TimeInOnly => &TIME_IN_ONLY,
        SourceFormat::FullSplit => &FULL_SPLIT,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableReading {
    pub readings: Vec<SplitReading>,
    pub rejections: Vec<RowRejection>,
}

pub fn read_table(
    format: SourceFormat,
    table: &RawTable,
    anchor: &RaceAnchor,
) -> Result<TableReading, FormatError> {
    read_with_parser(parser_for(format), table, anchor)
}

pub fn read_with_parser(
    parser: &dyn SplitParser,
    table: &RawTable,
    anchor: &RaceAnchor,
) -> Result<TableReading, FormatError> {
    let layout = parser.bind(&table.columns)?;
    let mut out = TableReading::default();

    for row in &table.rows {
        match parser.read_row(&layout, row, anchor) {
            RowOutcome::Read(reading) => out.readings.push(reading),
            RowOutcome::Rejected(rejection) => out.rejections.push(rejection),
        }
    }

    Ok(out)
}
