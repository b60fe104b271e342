use super::{PersistenceResult, ScheduleStore};
use crate::metadata::ScheduleMetadata;
use crate::schedule::{RefreshSummary, ScheduleReport, ScheduledTask};
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS schedule_report (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                metadata_json TEXT NOT NULL,
                summary_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS scheduled_tasks (
                position INTEGER PRIMARY KEY,
                task_id TEXT NOT NULL UNIQUE,
                task_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_header(
        &self,
        tx: &rusqlite::Transaction,
        report: &ScheduleReport,
    ) -> PersistenceResult<()> {
        let metadata = serde_json::to_string(&report.metadata)?;
        let summary = serde_json::to_string(&report.summary)?;
        tx.execute("DELETE FROM schedule_report", [])?;
        tx.execute(
            "INSERT INTO schedule_report (id, metadata_json, summary_json) VALUES (1, ?1, ?2)",
            params![metadata, summary],
        )?;
        Ok(())
    }

    fn save_tasks(&self, tx: &rusqlite::Transaction, report: &ScheduleReport) -> PersistenceResult<()> {
        tx.execute("DELETE FROM scheduled_tasks", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO scheduled_tasks (position, task_id, task_json) VALUES (?1, ?2, ?3)",
        )?;
        for (position, task) in report.tasks.iter().enumerate() {
            let json = serde_json::to_string(task)?;
            stmt.execute(params![position as i64, task.id.as_str(), json])?;
        }
        Ok(())
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn save_report(&self, report: &ScheduleReport) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite connection poisoned");
        let tx = conn.transaction()?;
        self.save_header(&tx, report)?;
        self.save_tasks(&tx, report)?;
        tx.commit()?;
        Ok(())
    }

    fn load_report(&self) -> PersistenceResult<Option<ScheduleReport>> {
        let conn = self.connection.lock().expect("sqlite connection poisoned");
        let header: Option<(String, String)> = conn
            .query_row(
                "SELECT metadata_json, summary_json FROM schedule_report WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((metadata_json, summary_json)) = header else {
            return Ok(None);
        };
        let metadata: ScheduleMetadata = serde_json::from_str(&metadata_json)?;
        let summary: RefreshSummary = serde_json::from_str(&summary_json)?;

        let mut stmt = conn.prepare("SELECT task_json FROM scheduled_tasks ORDER BY position")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut tasks = Vec::new();
        for json in rows {
            let task: ScheduledTask = serde_json::from_str(&json?)?;
            tasks.push(task);
        }

        Ok(Some(ScheduleReport {
            metadata,
            summary,
            tasks,
        }))
    }
}
