pub mod audit;
pub mod calendar;
pub mod config;
pub mod merger;
pub mod normalizer;
pub mod output;
pub mod pipeline;
pub mod progression;
pub mod record;
pub mod runner;
pub mod stations;

pub use audit::{AuditEntry, AuditKind, AuditLog};
pub use calendar::{CalendarError, RaceCalendar, RaceYearConfig};
pub use config::{ConfigError, RaceConfigFile};
pub use merger::{merge, CanonicalDataset};
pub use normalizer::{normalize_year, YearError, YearTable};
pub use output::{to_dataframe, valid_frame, write_csv, write_parquet, OutputError};
pub use pipeline::{run, RunReport, YearFailure, YearInput, YearSummary};
pub use record::{BibKey, CheckpointRecord};
pub use runner::{RunnerCheckpoint, RunnerRaceResult};
pub use stations::{AidStation, Course, CourseError};

pub use pacesplits_parser as parser;
