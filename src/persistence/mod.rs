use crate::schedule::ScheduleReport;
use crate::task::TaskError;
use serde_json::Error as SerdeJsonError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },
    #[error("line {line}: {source}")]
    Task {
        line: u64,
        #[source]
        source: TaskError,
    },
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("no schedule stored")]
    NotFound,
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Somewhere a resolved schedule can be kept and read back.
pub trait ScheduleStore {
    fn save_report(&self, report: &ScheduleReport) -> PersistenceResult<()>;
    fn load_report(&self) -> PersistenceResult<Option<ScheduleReport>>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    CsvOptions, JsonFileStore, load_tasks_from_csv, read_tasks_from_csv, save_report_to_csv,
    write_report_csv,
};
