pub mod calculations;
pub mod calendar;
pub mod graph;
pub mod logging;
pub mod metadata;
pub mod persistence;
pub mod schedule;
pub mod task;

pub use calculations::forward_pass::{ForwardPass, PassOutcome};
pub use calendar::{CalendarError, WorkCalendar};
pub use graph::{GraphError, TaskGraph};
pub use metadata::{ScheduleMetadata, ScheduleMetadataError};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteScheduleStore;
pub use persistence::{
    CsvOptions, JsonFileStore, PersistenceError, ScheduleStore, load_tasks_from_csv,
    read_tasks_from_csv, save_report_to_csv, write_report_csv,
};
pub use schedule::{
    RefreshSummary, Schedule, ScheduleError, ScheduleReport, ScheduledTask,
};
pub use task::{DependencySpec, EffortRange, ScheduleSpan, Task, TaskError, TaskId, Variant};
