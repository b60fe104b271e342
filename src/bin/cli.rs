use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use schedule_forecast::logging::init_logging;
use schedule_forecast::{
    CsvOptions, JsonFileStore, Schedule, ScheduleMetadata, ScheduleReport, ScheduleStore,
    load_tasks_from_csv, save_report_to_csv,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

/// Forecast task start and end dates on a Monday to Friday calendar.
#[derive(Debug, Parser)]
#[command(name = "cli", version, about)]
struct Cli {
    /// Task CSV: id, dependencies, duration[, min_duration, max_duration]
    #[arg(short, long)]
    input: PathBuf,

    /// Write the resolved schedule here instead of printing a table
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// JSON file with project_name and project_start_date
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project start date, overrides the config file
    #[arg(short, long, env = "SCHEDULE_START")]
    start: Option<NaiveDate>,

    /// Field delimiter for CSV input and output
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Also store the resolved schedule in this SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn csv_options(delimiter: char) -> Result<CsvOptions> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{delimiter}'");
    }
    Ok(CsvOptions {
        delimiter: delimiter as u8,
    })
}

fn load_metadata(cli: &Cli) -> Result<ScheduleMetadata> {
    let mut metadata = match &cli.config {
        Some(path) => ScheduleMetadata::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScheduleMetadata::default(),
    };
    if let Some(start) = cli.start {
        metadata.project_start_date = start;
    }
    Ok(metadata)
}

fn push_table_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    out.push('|');
    for (ci, cell) in cells.enumerate() {
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        out.push_str(" |");
    }
    out.push('\n');
}

fn render_report_as_text_table(report: &ScheduleReport) -> String {
    let headers = [
        "id",
        "dependencies",
        "duration",
        "start",
        "end",
        "min_start",
        "min_end",
        "max_start",
        "max_end",
    ];
    let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let rows: Vec<Vec<String>> = report
        .tasks
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.dependencies.clone(),
                t.duration.to_string(),
                t.start.to_string(),
                t.end.to_string(),
                date(t.min_start),
                date(t.min_end),
                date(t.max_start),
                date(t.max_end),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_table_row(&mut out, &widths, headers.iter().copied());
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        push_table_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

#[cfg(feature = "sqlite")]
fn store_in_sqlite(path: &std::path::Path, report: &ScheduleReport) -> Result<()> {
    let store = schedule_forecast::SqliteScheduleStore::new(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    store
        .save_report(report)
        .with_context(|| format!("failed to write schedule to {}", path.display()))
}

#[cfg(not(feature = "sqlite"))]
fn store_in_sqlite(path: &std::path::Path, _report: &ScheduleReport) -> Result<()> {
    bail!(
        "cannot write {}: built without the sqlite feature",
        path.display()
    )
}

fn run(cli: Cli) -> Result<()> {
    let options = csv_options(cli.delimiter)?;
    let metadata = load_metadata(&cli)?;

    let tasks = load_tasks_from_csv(&cli.input, &options)
        .with_context(|| format!("failed to read tasks from {}", cli.input.display()))?;
    let mut schedule =
        Schedule::from_tasks(metadata, tasks).context("failed to build task graph")?;
    let summary = schedule.refresh().context("failed to resolve schedule")?;
    let report = schedule.report()?;

    if let Some(path) = &cli.sqlite {
        store_in_sqlite(path, &report)?;
    }

    match &cli.output {
        Some(path) => match cli.format {
            OutputFormat::Csv => save_report_to_csv(&report, path, &options)
                .with_context(|| format!("failed to write {}", path.display()))?,
            OutputFormat::Json => JsonFileStore::new(path)
                .save_report(&report)
                .with_context(|| format!("failed to write {}", path.display()))?,
        },
        None => {
            print!("{}", render_report_as_text_table(&report));
            println!("Refreshed ({})", summary.to_cli_summary());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
