use super::common::ColumnRole;

/// Column order of the canonical checkpoint table.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "year",
    "bib",
    "station_id",
    "station_order",
    "check_in",
    "check_out",
    "source_format",
    "valid",
    "invalid_reason",
    "is_outlier",
];

pub const ALL_ROLES: [ColumnRole; 8] = [
    ColumnRole::Bib,
    ColumnRole::Station,
    ColumnRole::TimeIn,
    ColumnRole::TimeInElapsed,
    ColumnRole::CheckIn,
    ColumnRole::CheckInElapsed,
    ColumnRole::CheckOut,
    ColumnRole::CheckOutElapsed,
];

/// Header spellings seen across the yearly exports, lowercase.
pub fn aliases(role: ColumnRole) -> &'static [&'static str] {
    match role {
        ColumnRole::Bib => &["bib", "bib_number", "bib_no", "runner_bib"],
        ColumnRole::Station => &["station", "aid_station", "as_name", "station_id", "checkpoint"],
        ColumnRole::TimeIn => &["time_in", "as_time_in", "arrival"],
        ColumnRole::TimeInElapsed => &["time_in_elapsed", "as_time_in__elapsed"],
        ColumnRole::CheckIn => &["check_in", "as_check_in__tod", "check_in_tod"],
        ColumnRole::CheckInElapsed => &["check_in_elapsed", "as_check_in__elapsed"],
        ColumnRole::CheckOut => &["check_out", "as_check_out__tod", "check_out_tod"],
        ColumnRole::CheckOutElapsed => &["check_out_elapsed", "as_check_out__elapsed"],
    }
}
