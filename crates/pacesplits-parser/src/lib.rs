pub mod errors;
pub mod formats;
pub mod model;
mod registry;
pub mod time;

pub use errors::{FormatError, TimeParseError};
pub use model::{
    FieldReading, RaceAnchor, RawRow, RawTable, RejectionReason, RowOutcome, RowRejection,
    SourceFormat, SplitReading, TimeSource,
};
pub use registry::{parser_for, read_table, read_with_parser, SplitParser, TableReading};
pub use time::{elapsed_to_timestamp, parse_clock, parse_elapsed, parse_time_of_day};

#[cfg(test)]
mod tests;
