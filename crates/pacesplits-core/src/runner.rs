use chrono::NaiveDateTime;
use serde::Serialize;

use crate::calendar::{CalendarError, RaceCalendar};
use crate::record::{canonical_order, CheckpointRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerCheckpoint {
    pub station_id: String,
    pub station_order: Option<u32>,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    /// Minutes from the gun to check-in.
    pub elapsed_minutes: Option<f64>,
    pub valid: bool,
}

/// One runner's race, checkpoints in course order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerRaceResult {
    pub year: i32,
    pub bib: String,
    pub checkpoints: Vec<RunnerCheckpoint>,
}

impl RunnerRaceResult {
    /// Builds every runner's view from canonical records of any number of years.
    pub fn collect(
        calendar: &RaceCalendar,
        records: &[CheckpointRecord],
    ) -> Result<Vec<RunnerRaceResult>, CalendarError> {
        let mut ordered: Vec<&CheckpointRecord> = records.iter().collect();
        ordered.sort_by(|a, b| canonical_order(a, b));

        let mut results: Vec<RunnerRaceResult> = Vec::new();
        for record in ordered {
            let start = calendar.year(record.year)?.race_start();
            let checkpoint = RunnerCheckpoint {
                station_id: record.station_id.clone(),
                station_order: record.station_order,
                check_in: record.check_in,
                check_out: record.check_out,
                elapsed_minutes: record
                    .check_in
                    .map(|at| (at - start).num_seconds() as f64 / 60.0),
                valid: record.valid,
            };

            match results.last_mut() {
                Some(last) if last.year == record.year && last.bib == record.bib => {
                    last.checkpoints.push(checkpoint)
                }
                _ => results.push(RunnerRaceResult {
                    year: record.year,
                    bib: record.bib.clone(),
                    checkpoints: vec![checkpoint],
                }),
            }
        }

        Ok(results)
    }

    /// Last valid check-in along the course.
    pub fn last_valid_checkpoint(&self) -> Option<&RunnerCheckpoint> {
        self.checkpoints
            .iter()
            .rev()
            .find(|c| c.valid && c.check_in.is_some())
    }
}
