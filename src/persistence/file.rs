use super::{PersistenceError, PersistenceResult, ScheduleStore};
use crate::schedule::ScheduleReport;
use crate::task::Task;
use csv::StringRecord;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const COLUMN_TASK_ID: usize = 0;
const COLUMN_DEPENDENCIES: usize = 1;
const COLUMN_DURATION: usize = 2;
const COLUMN_MIN_DURATION: usize = 3;
const COLUMN_MAX_DURATION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Read task records: a header row, then `id, dependencies, duration` with
/// optional `min_duration, max_duration` columns. Multiple dependencies go in
/// one quoted field. Id and duration fields are trimmed; the dependency text
/// is kept as written.
pub fn read_tasks_from_csv<R: Read>(reader: R, options: &CsvOptions) -> PersistenceResult<Vec<Task>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut tasks = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |pos| pos.line());
        let task = task_from_record(&record, line)?;
        debug!(task = %task.id(), line, "read task");
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV input contained no tasks".into(),
        ));
    }
    Ok(tasks)
}

pub fn load_tasks_from_csv<P: AsRef<Path>>(
    path: P,
    options: &CsvOptions,
) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    read_tasks_from_csv(BufReader::new(file), options)
}

fn task_from_record(record: &StringRecord, line: u64) -> PersistenceResult<Task> {
    let id = field(record, COLUMN_TASK_ID).ok_or_else(|| malformed(line, "missing task id"))?;
    // Echoed back verbatim in reports, so never trimmed.
    let dependencies = record.get(COLUMN_DEPENDENCIES).unwrap_or_default();
    let duration = parse_effort(record, COLUMN_DURATION, "duration", line)?
        .ok_or_else(|| malformed(line, "missing duration"))?;
    let min_duration = parse_effort(record, COLUMN_MIN_DURATION, "min duration", line)?;
    let max_duration = parse_effort(record, COLUMN_MAX_DURATION, "max duration", line)?;

    Task::from_parts(id, dependencies, duration, min_duration, max_duration)
        .map_err(|source| PersistenceError::Task { line, source })
}

fn field(record: &StringRecord, column: usize) -> Option<&str> {
    record
        .get(column)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_effort(
    record: &StringRecord,
    column: usize,
    name: &str,
    line: u64,
) -> PersistenceResult<Option<f64>> {
    let Some(text) = field(record, column) else {
        return Ok(None);
    };
    text.parse::<f64>()
        .map(Some)
        .map_err(|e| malformed(line, format!("invalid {name} '{text}': {e}")))
}

fn malformed(line: u64, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::MalformedRecord {
        line,
        reason: reason.into(),
    }
}

/// Write one row per task with date-only columns. Min/max columns are empty
/// for tasks without a duration range.
pub fn write_report_csv<W: Write>(
    report: &ScheduleReport,
    writer: W,
    options: &CsvOptions,
) -> PersistenceResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    for task in &report.tasks {
        writer.serialize(task)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_report_to_csv<P: AsRef<Path>>(
    report: &ScheduleReport,
    path: P,
    options: &CsvOptions,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_report_csv(report, BufWriter::new(file), options)
}

/// Stores a report as pretty-printed JSON, metadata and summary included.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonFileStore {
    fn save_report(&self, report: &ScheduleReport) -> PersistenceResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush()?;
        Ok(())
    }

    fn load_report(&self) -> PersistenceResult<Option<ScheduleReport>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }
}
