//! TOML race configuration.
//!
//! ```toml
//! fill_missing_stations = false
//!
//! [defaults]
//! start_time = "05:00"
//! max_elapsed_hours = 60
//!
//! [[stations]]
//! id = "AS1"
//! name = "Ramsey"
//! order = 1
//!
//! [[years]]
//! year = 2021
//! race_date = "2021-08-14"
//! format = "full_split"
//! input = "2021.csv"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use pacesplits_parser::{parse_clock, SourceFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::calendar::{
    default_start_time, RaceCalendar, RaceYearConfig, DEFAULT_MAX_ELAPSED_HOURS,
    MAX_ELAPSED_HOURS_LIMIT,
};
use crate::stations::{AidStation, Course, CourseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse race configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("year {0} is configured more than once")]
    DuplicateYear(i32),
    #[error("invalid race date '{value}' for year {year}")]
    InvalidDate { year: i32, value: String },
    #[error("invalid start time '{value}': {reason}")]
    InvalidStartTime { value: String, reason: String },
    #[error(
        "max_elapsed_hours {value} is outside 1..={} (year {year:?})",
        MAX_ELAPSED_HOURS_LIMIT
    )]
    InvalidMaxElapsed { year: Option<i32>, value: u32 },
    #[error("invalid course (year {year:?}): {source}")]
    Course {
        year: Option<i32>,
        #[source]
        source: CourseError,
    },
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub start_time: Option<String>,
    pub max_elapsed_hours: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YearEntry {
    pub year: i32,
    pub race_date: String,
    pub format: SourceFormat,
    pub start_time: Option<String>,
    pub max_elapsed_hours: Option<u32>,
    #[serde(default)]
    pub stations: Option<Vec<AidStation>>,
    /// Raw split export for this year, relative to the configuration file.
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RaceConfigFile {
    #[serde(default)]
    pub fill_missing_stations: bool,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub stations: Vec<AidStation>,
    #[serde(default)]
    pub years: Vec<YearEntry>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl RaceConfigFile {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<RaceConfigFile>(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Configured input files, resolved against the configuration's directory.
    pub fn inputs(&self) -> Vec<(i32, PathBuf)> {
        self.years
            .iter()
            .filter_map(|entry| {
                let input = entry.input.as_ref()?;
                let resolved = match &self.base_dir {
                    Some(base) if input.is_relative() => base.join(input),
                    _ => input.clone(),
                };
                Some((entry.year, resolved))
            })
            .collect()
    }

    pub fn to_calendar(&self) -> Result<RaceCalendar, ConfigError> {
        let course = Course::new(self.stations.clone())
            .map_err(|source| ConfigError::Course { year: None, source })?;

        let default_start = match &self.defaults.start_time {
            Some(value) => parse_start_time(value)?,
            None => default_start_time(),
        };
        let default_max = self
            .defaults
            .max_elapsed_hours
            .unwrap_or(DEFAULT_MAX_ELAPSED_HOURS);
        check_max_elapsed(None, default_max)?;

        let mut calendar =
            RaceCalendar::new(course).with_fill_missing_stations(self.fill_missing_stations);
        let mut seen = HashSet::new();

        for entry in &self.years {
            if !seen.insert(entry.year) {
                return Err(ConfigError::DuplicateYear(entry.year));
            }

            let race_date = NaiveDate::parse_from_str(entry.race_date.trim(), "%Y-%m-%d")
                .map_err(|_| ConfigError::InvalidDate {
                    year: entry.year,
                    value: entry.race_date.clone(),
                })?;
            let start_time = match &entry.start_time {
                Some(value) => parse_start_time(value)?,
                None => default_start,
            };
            let max_elapsed_hours = entry.max_elapsed_hours.unwrap_or(default_max);
            check_max_elapsed(Some(entry.year), max_elapsed_hours)?;

            let mut config = RaceYearConfig::new(entry.year, race_date, entry.format)
                .with_start_time(start_time)
                .with_max_elapsed_hours(max_elapsed_hours);
            if let Some(stations) = &entry.stations {
                let course = Course::new(stations.clone()).map_err(|source| ConfigError::Course {
                    year: Some(entry.year),
                    source,
                })?;
                config = config.with_course(course);
            }
            calendar.insert(config);
        }

        Ok(calendar)
    }
}

fn check_max_elapsed(year: Option<i32>, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_ELAPSED_HOURS_LIMIT {
        return Err(ConfigError::InvalidMaxElapsed { year, value });
    }
    Ok(())
}

fn parse_start_time(value: &str) -> Result<NaiveTime, ConfigError> {
    parse_clock(value).map_err(|err| ConfigError::InvalidStartTime {
        value: value.to_string(),
        reason: err.to_string(),
    })
}
