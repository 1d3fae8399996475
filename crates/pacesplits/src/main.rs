use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use pacesplits_core::{
    run, write_csv, write_parquet, RaceCalendar, RaceConfigFile, RunnerRaceResult, YearInput,
};
use pacesplits_parser::{elapsed_to_timestamp, parse_time_of_day};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod summary;

#[derive(Parser, Debug)]
#[command(author, version, about = "Normalize ultramarathon checkpoint splits", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize every configured race year into one canonical table
    Normalize(NormalizeArgs),
    /// Show the configured race years
    Calendar(CalendarArgs),
    /// Resolve a single raw time cell against a race year
    ParseTime(ParseTimeArgs),
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Race configuration (TOML)
    #[arg(long)]
    config: PathBuf,
    /// Canonical CSV output
    #[arg(long)]
    output: PathBuf,
    /// Also write the canonical table as Parquet
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Write every audit entry as JSON lines
    #[arg(long)]
    audit: Option<PathBuf>,
    /// Write per-runner results as JSON
    #[arg(long)]
    runners: Option<PathBuf>,
    /// Audit entries of each kind to print in the summary
    #[arg(long, default_value_t = 3)]
    sample: usize,
}

#[derive(Args, Debug, Default)]
struct CalendarArgs {
    /// Race configuration; the built-in historical calendar is used without one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ParseTimeArgs {
    /// Raw cell value, e.g. "02:15" or "30:15:00"
    value: String,
    #[arg(long)]
    year: i32,
    /// Treat the value as elapsed time since the start
    #[arg(long)]
    elapsed: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Normalize(args) => normalize(args),
        Command::Calendar(args) => {
            let calendar = load_calendar(args.config.as_deref())?;
            println!("{}", summary::calendar_table(&calendar));
            Ok(())
        }
        Command::ParseTime(args) => parse_time(args),
    }
}

fn load_calendar(config: Option<&Path>) -> Result<RaceCalendar> {
    match config {
        Some(path) => RaceConfigFile::load(path)
            .and_then(|file| file.to_calendar())
            .with_context(|| format!("failed to load race configuration {}", path.display())),
        None => Ok(RaceCalendar::eastern_states()),
    }
}

fn normalize(args: NormalizeArgs) -> Result<()> {
    let config = RaceConfigFile::load(&args.config)
        .with_context(|| format!("failed to load race configuration {}", args.config.display()))?;
    let calendar = config
        .to_calendar()
        .context("invalid race configuration")?;

    let mut inputs = Vec::new();
    let mut unreadable = Vec::new();
    for (year, path) in config.inputs() {
        match YearInput::from_csv_path(year, &path) {
            Ok(input) => {
                info!(year, path = %path.display(), rows = input.table.len(), "Loaded race year");
                inputs.push(input);
            }
            Err(err) => unreadable.push((year, format!("{}: {err}", path.display()))),
        }
    }
    if inputs.is_empty() && unreadable.is_empty() {
        bail!("no race year in {} names an input file", args.config.display());
    }

    let mut report = run(&calendar, inputs);
    for (year, error) in unreadable {
        report.push_failure(year, error);
    }
    if report.years.is_empty() {
        bail!("every race year failed; see the summary log");
    }

    let mut csv_bytes = Vec::new();
    write_csv(&report.dataset.records, &mut csv_bytes).context("failed to render canonical csv")?;
    fs::write(&args.output, &csv_bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    let digest = blake3::hash(&csv_bytes);
    info!(path = %args.output.display(), digest = %digest.to_hex(), "Wrote canonical csv");

    if let Some(path) = &args.parquet {
        write_parquet(&report.dataset.records, create(path)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(path) = &args.audit {
        report
            .audit
            .write_jsonl(create(path)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if let Some(path) = &args.runners {
        let runners = RunnerRaceResult::collect(&calendar, &report.dataset.records)?;
        serde_json::to_writer_pretty(create(path)?, &runners)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    for failure in &report.year_failures {
        warn!(year = failure.year, error = %failure.error, "Year skipped");
    }

    println!("{}", summary::year_table(&report));
    if !report.audit.is_empty() {
        println!("{}", summary::audit_table(&report, args.sample));
    }
    println!("{}  {}", digest.to_hex(), args.output.display());
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn parse_time(args: ParseTimeArgs) -> Result<()> {
    let calendar = load_calendar(args.config.as_deref())?;
    let anchor = calendar.anchor(args.year)?;

    let resolved = if args.elapsed {
        elapsed_to_timestamp(&args.value, anchor.start())
    } else {
        parse_time_of_day(&args.value, &anchor)
    }
    .with_context(|| format!("cannot resolve '{}' for {}", args.value, args.year))?;

    let elapsed = anchor.elapsed_since_start(resolved);
    println!(
        "{}  (+{}:{:02}:{:02})",
        resolved.format("%Y-%m-%dT%H:%M:%S%.f"),
        elapsed.num_hours(),
        elapsed.num_minutes() % 60,
        elapsed.num_seconds() % 60
    );
    Ok(())
}
