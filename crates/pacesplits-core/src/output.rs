use std::io::Write;

use chrono::NaiveDateTime;
use pacesplits_parser::formats::schema::CANONICAL_COLUMNS;
use polars::prelude::*;
use thiserror::Error;

use crate::record::CheckpointRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to build output frame: {0}")]
    Polars(#[from] PolarsError),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

fn micros(values: impl Iterator<Item = Option<NaiveDateTime>>) -> Vec<Option<i64>> {
    values
        .map(|value| value.map(|dt| dt.and_utc().timestamp_micros()))
        .collect()
}

/// Canonical records as a polars frame, columns in canonical order and
/// timestamps as naive `Datetime(us)`.
pub fn to_dataframe(records: &[CheckpointRecord]) -> PolarsResult<DataFrame> {
    let datetime = DataType::Datetime(TimeUnit::Microseconds, None);

    let year = Series::new(
        "year".into(),
        records.iter().map(|r| r.year).collect::<Vec<i32>>(),
    );
    let bib = Series::new(
        "bib".into(),
        records.iter().map(|r| r.bib.as_str()).collect::<Vec<&str>>(),
    );
    let station_id = Series::new(
        "station_id".into(),
        records
            .iter()
            .map(|r| r.station_id.as_str())
            .collect::<Vec<&str>>(),
    );
    let station_order = Series::new(
        "station_order".into(),
        records
            .iter()
            .map(|r| r.station_order)
            .collect::<Vec<Option<u32>>>(),
    );
    let check_in = Series::new(
        "check_in".into(),
        micros(records.iter().map(|r| r.check_in)),
    )
    .cast(&datetime)?;
    let check_out = Series::new(
        "check_out".into(),
        micros(records.iter().map(|r| r.check_out)),
    )
    .cast(&datetime)?;
    let source_format = Series::new(
        "source_format".into(),
        records
            .iter()
            .map(|r| r.source_format.as_str())
            .collect::<Vec<&str>>(),
    );
    let valid = Series::new(
        "valid".into(),
        records.iter().map(|r| r.valid).collect::<Vec<bool>>(),
    );
    let invalid_reason = Series::new(
        "invalid_reason".into(),
        records
            .iter()
            .map(|r| r.invalid_reason.clone())
            .collect::<Vec<Option<String>>>(),
    );
    let is_outlier = Series::new(
        "is_outlier".into(),
        records.iter().map(|r| r.is_outlier).collect::<Vec<bool>>(),
    );

    DataFrame::new(vec![
        year.into(),
        bib.into(),
        station_id.into(),
        station_order.into(),
        check_in.into(),
        check_out.into(),
        source_format.into(),
        valid.into(),
        invalid_reason.into(),
        is_outlier.into(),
    ])
}

/// Rows with `valid = true` only.
pub fn valid_frame(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.clone().lazy().filter(col("valid")).collect()
}

/// Writes the canonical CSV. Identical records always produce identical bytes.
pub fn write_csv<W: Write>(records: &[CheckpointRecord], writer: W) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        writer.write_record(CANONICAL_COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_parquet<W: Write>(records: &[CheckpointRecord], writer: W) -> Result<(), OutputError> {
    let mut df = to_dataframe(records)?;
    ParquetWriter::new(writer).finish(&mut df)?;
    Ok(())
}
