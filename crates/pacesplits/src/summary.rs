use comfy_table::Table;
use pacesplits_core::{RaceCalendar, RunReport};

pub fn calendar_table(calendar: &RaceCalendar) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "year",
        "race date",
        "start",
        "format",
        "max hours",
        "stations",
    ]);
    for config in calendar.years() {
        let stations = calendar
            .course(config.year)
            .map(|course| course.stations().len())
            .unwrap_or_default();
        table.add_row(vec![
            config.year.to_string(),
            config.race_date.to_string(),
            config.start_time.format("%H:%M").to_string(),
            config.format.to_string(),
            config.max_elapsed_hours.to_string(),
            stations.to_string(),
        ]);
    }
    table
}

pub fn year_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "year", "format", "raw", "rejected", "superseded", "filled", "records", "valid",
        "outliers",
    ]);
    for year in &report.years {
        table.add_row(vec![
            year.year.to_string(),
            year.format.to_string(),
            year.raw_rows.to_string(),
            year.rejected.to_string(),
            year.superseded.to_string(),
            year.filled.to_string(),
            year.records.to_string(),
            year.valid.to_string(),
            year.outliers.to_string(),
        ]);
    }
    for failure in &report.year_failures {
        table.add_row(vec![
            failure.year.to_string(),
            format!("FAILED: {}", failure.error),
        ]);
    }
    table
}

/// Counts per audit kind, then a few example entries of each.
pub fn audit_table(report: &RunReport, sample: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["kind", "count", "year", "line", "bib", "station", "detail"]);

    for (kind, count) in report.audit_counts() {
        table.add_row(vec![kind.as_str().to_string(), count.to_string()]);
    }
    for entry in report.audit.sample(sample) {
        table.add_row(vec![
            entry.kind.as_str().to_string(),
            String::new(),
            entry.year.to_string(),
            entry.line_index.map(|l| l.to_string()).unwrap_or_default(),
            entry.bib.clone().unwrap_or_default(),
            entry.station.clone().unwrap_or_default(),
            entry.detail.clone(),
        ]);
    }
    table
}
