use chrono::NaiveDate;
use pacesplits_core::{merge, normalize_year, RaceCalendar, RaceYearConfig};
use pacesplits_parser::{RawTable, SourceFormat};
use proptest::prelude::*;

fn time_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-2][0-9]:[0-5][0-9](:[0-5][0-9])?",
        "[0-9]{1,3}:[0-9]{1,2}",
        "[a-z ]{0,6}",
    ]
}

fn rows() -> impl Strategy<Value = Vec<(u32, u32, String, String)>> {
    prop::collection::vec((0u32..40, 1u32..15, time_cell(), time_cell()), 0..40)
}

fn build(columns: [&str; 4], rows: &[(u32, u32, String, String)]) -> RawTable {
    let mut table = RawTable::new(columns.iter().map(|c| c.to_string()).collect());
    for (bib, station, first, second) in rows {
        let bib = if *bib == 0 { String::new() } else { bib.to_string() };
        table.push_row([bib, format!("AS{station}"), first.clone(), second.clone()]);
    }
    table
}

fn calendar() -> RaceCalendar {
    let mut calendar = RaceCalendar::eastern_states();
    calendar.insert(RaceYearConfig::new(
        2024,
        NaiveDate::from_ymd_opt(2024, 8, 10).unwrap(),
        SourceFormat::TimeInOnly,
    ));
    calendar
}

proptest! {
    #[test]
    fn time_in_only_never_has_check_out(rows in rows()) {
        let table = build(["bib", "station", "time_in", "check_out"], &rows);
        let year = normalize_year(&calendar(), 2024, &table).unwrap();

        for record in &year.records {
            prop_assert!(record.check_out.is_none());
            prop_assert_eq!(record.source_format, SourceFormat::TimeInOnly);
        }
        prop_assert_eq!(
            year.records.len(),
            year.raw_rows - year.rejected - year.superseded
        );
    }

    #[test]
    fn merge_row_count_is_sum_of_years(a in rows(), b in rows()) {
        let calendar = calendar();
        let full_split = build(["bib", "station", "check_in", "check_out"], &a);
        let time_in_only = build(["bib", "station", "time_in", "note"], &b);
        let tables = vec![
            normalize_year(&calendar, 2021, &full_split).unwrap(),
            normalize_year(&calendar, 2024, &time_in_only).unwrap(),
        ];

        let merged = merge(&tables);
        let expected: usize = tables.iter().map(|t| t.records.len()).sum();
        prop_assert_eq!(merged.len(), expected);
        for window in merged.records.windows(2) {
            prop_assert!(window[0].year <= window[1].year);
        }
    }
}
