use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use proptest::prelude::*;

use crate::errors::{FormatError, TimeParseError};
use crate::formats::schema::CANONICAL_COLUMNS;
use crate::formats::{ColumnRole, FullSplitParser, TimeInOnlyParser};
use crate::model::{
    FieldReading, RaceAnchor, RawTable, RejectionReason, SourceFormat, TimeSource,
};
use crate::registry::{parser_for, read_table, read_with_parser, SplitParser};
use crate::time::{elapsed_to_timestamp, parse_time_of_day};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn anchor(y: i32, m: u32, d: u32) -> RaceAnchor {
    RaceAnchor::new(
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
    )
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn registry_selects_reader_by_declared_format() {
    assert_eq!(parser_for(SourceFormat::TimeInOnly).name(), "TIME_IN_ONLY");
    assert_eq!(parser_for(SourceFormat::FullSplit).name(), "FULL_SPLIT");
    assert_eq!(
        parser_for(SourceFormat::FullSplit).format(),
        SourceFormat::FullSplit
    );
}

#[test]
fn canonical_columns_are_stable() {
    assert_eq!(CANONICAL_COLUMNS[0], "year");
    assert_eq!(CANONICAL_COLUMNS[9], "is_outlier");
    assert_eq!(ColumnRole::CheckOut.canonical_name(), "check_out");
}

#[test]
fn reads_time_in_only_export() {
    let table = RawTable::from_csv_str(&fixture("ultralive_2016.csv")).expect("csv");
    assert_eq!(table.len(), 7);

    let reading = read_table(SourceFormat::TimeInOnly, &table, &anchor(2016, 8, 13))
        .expect("time-in-only table");

    assert_eq!(reading.readings.len(), 5);
    assert_eq!(reading.rejections.len(), 2);
    assert_eq!(reading.rejections[0].reason, RejectionReason::MissingBib);
    assert_eq!(reading.rejections[0].line_index, 7);
    assert_eq!(reading.rejections[1].reason, RejectionReason::MissingStation);

    for split in &reading.readings {
        assert_eq!(split.check_out, FieldReading::Missing);
    }

    let overnight = &reading.readings[2];
    assert_eq!(overnight.bib, "104");
    assert_eq!(overnight.station, "AS9");
    assert_eq!(
        overnight.check_in,
        FieldReading::Parsed {
            at: ts("2016-08-14 02:15:00"),
            source: TimeSource::TimeOfDay,
        }
    );

    let bad = &reading.readings[4];
    assert_eq!(bad.bib, "23");
    assert!(matches!(
        bad.check_in,
        FieldReading::Failed(TimeParseError::OutOfRange { .. })
    ));
}

#[test]
fn reads_full_split_export_with_elapsed_fallback() {
    let table = RawTable::from_csv_str(&fixture("splits_2021.csv")).expect("csv");
    let reading = read_table(SourceFormat::FullSplit, &table, &anchor(2021, 8, 14))
        .expect("full split table");

    assert_eq!(reading.readings.len(), 5);
    assert!(reading.rejections.is_empty());

    let as5 = &reading.readings[1];
    assert_eq!(as5.check_in.timestamp(), Some(ts("2021-08-14 13:20:00")));
    assert!(matches!(
        as5.check_out,
        FieldReading::Failed(TimeParseError::Malformed { .. })
    ));

    let as9 = &reading.readings[2];
    assert_eq!(
        as9.check_in,
        FieldReading::Parsed {
            at: ts("2021-08-15 11:15:00"),
            source: TimeSource::Elapsed,
        }
    );
    assert_eq!(as9.check_out.timestamp(), Some(ts("2021-08-15 11:20:00")));

    let as12 = &reading.readings[3];
    assert_eq!(as12.check_in.timestamp(), Some(ts("2021-08-15 04:10:00")));
    assert_eq!(as12.check_out.timestamp(), Some(ts("2021-08-15 04:05:00")));
}

#[test]
fn full_split_without_check_out_column_is_accepted() {
    let mut table = RawTable::new(vec!["bib".into(), "station".into(), "check_in".into()]);
    table.push_row(["9", "AS2", "09:00"]);

    let reading = read_with_parser(&FullSplitParser, &table, &anchor(2022, 8, 13)).unwrap();
    assert_eq!(reading.readings[0].check_out, FieldReading::Missing);
}

#[test]
fn missing_required_column_is_a_schema_mismatch() {
    let table = RawTable::new(vec!["bib".into(), "station".into(), "check_in".into()]);
    let err = read_with_parser(&TimeInOnlyParser, &table, &anchor(2016, 8, 13)).unwrap_err();
    match err {
        FormatError::SchemaMismatch { parser, missing } => {
            assert_eq!(parser, "TIME_IN_ONLY");
            assert_eq!(missing, vec!["time_in"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn ambiguous_headers_are_rejected() {
    let table = RawTable::new(vec![
        "bib".into(),
        "bib_number".into(),
        "station".into(),
        "time_in".into(),
    ]);
    assert!(matches!(
        TimeInOnlyParser.bind(&table.columns),
        Err(FormatError::DuplicateColumn { .. })
    ));
}

#[test]
fn ragged_rows_are_rejected_structurally() {
    let mut table = RawTable::new(vec!["bib".into(), "station".into(), "time_in".into()]);
    table.push_row(["1", "AS1", "06:00", "extra"]);
    table.push_row(["2", "AS1"]);

    let reading = read_table(SourceFormat::TimeInOnly, &table, &anchor(2017, 8, 12)).unwrap();
    assert_eq!(
        reading.rejections[0].reason,
        RejectionReason::RaggedRow {
            expected: 3,
            found: 4
        }
    );
    assert_eq!(reading.readings.len(), 1);
    assert_eq!(reading.readings[0].check_in, FieldReading::Missing);
}

#[test]
fn trailing_empty_cells_are_not_ragged() {
    let table = RawTable::from_csv_str(
        "bib,station,time_in\n104,AS1,07:41\n104,AS5,14:32,\n23,AS1,07:12,,\n",
    )
    .unwrap();

    let reading = read_table(SourceFormat::TimeInOnly, &table, &anchor(2016, 8, 13)).unwrap();
    assert!(reading.rejections.is_empty());
    assert_eq!(reading.readings.len(), 3);
    assert_eq!(reading.readings[1].station, "AS5");
    assert_eq!(
        reading.readings[1].check_in.timestamp(),
        Some(ts("2016-08-13 14:32:00"))
    );
}

#[test]
fn blank_rows_are_kept_for_structural_rejection() {
    let table = RawTable::from_csv_str("bib,station,time_in\n7,AS1,06:00\n,,\n8,AS1,06:05\n")
        .unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[1].line_index, 3);

    let reading = read_table(SourceFormat::TimeInOnly, &table, &anchor(2017, 8, 12)).unwrap();
    assert_eq!(reading.readings.len(), 2);
    assert_eq!(reading.rejections.len(), 1);
    assert_eq!(reading.rejections[0].line_index, 3);
    assert_eq!(reading.rejections[0].reason, RejectionReason::MissingBib);
}

#[test]
fn empty_csv_has_no_header() {
    assert!(matches!(
        RawTable::from_csv_str(""),
        Err(FormatError::MissingHeader)
    ));
}

proptest! {
    #[test]
    fn rollover_depends_only_on_start_time(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
        let anchor = anchor(2021, 8, 14);
        let raw = format!("{h:02}:{m:02}:{s:02}");
        let at = parse_time_of_day(&raw, &anchor).unwrap();
        let time = NaiveTime::from_hms_opt(h, m, s).unwrap();
        if time < anchor.start_time {
            prop_assert_eq!(at.date(), anchor.race_date + Duration::days(1));
        } else {
            prop_assert_eq!(at.date(), anchor.race_date);
        }
        prop_assert_eq!(at.time(), time);
    }

    #[test]
    fn elapsed_offsets_are_exact(h in 24u32..200, m in 0u32..60, s in 0u32..60) {
        let start = anchor(2021, 8, 14).start();
        let raw = format!("{h}:{m:02}:{s:02}");
        let at = elapsed_to_timestamp(&raw, start).unwrap();
        let expected = start
            + Duration::hours(i64::from(h))
            + Duration::minutes(i64::from(m))
            + Duration::seconds(i64::from(s));
        prop_assert_eq!(at, expected);
    }
}
