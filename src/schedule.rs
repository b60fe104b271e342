use crate::calculations::forward_pass::{ForwardPass as CalcForwardPass, PassOutcome};
use crate::calendar::{CalendarError, WorkCalendar};
use crate::graph::{GraphError, TaskGraph};
use crate::metadata::ScheduleMetadata;
use crate::task::{Task, TaskError, TaskId, Variant};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("cannot schedule task {task}: {source}")]
    Calendar {
        task: TaskId,
        #[source]
        source: CalendarError,
    },
    #[error("{}", describe_stall(.unresolved, .cycles))]
    StalledPropagation {
        unresolved: Vec<TaskId>,
        cycles: Vec<Vec<TaskId>>,
    },
    #[error(
        "task {task} needs a {variant} schedule from dependency {dependency}, which has no min/max duration"
    )]
    MissingDurationVariant {
        task: TaskId,
        dependency: TaskId,
        variant: Variant,
    },
    #[error("schedule has already been resolved")]
    AlreadyResolved,
    #[error("schedule has not been resolved yet")]
    Unresolved,
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_stall(unresolved: &[TaskId], cycles: &[Vec<TaskId>]) -> String {
    let mut message = format!(
        "no task could be scheduled; unresolved tasks: {}",
        join_ids(unresolved)
    );
    if !cycles.is_empty() {
        let groups = cycles
            .iter()
            .map(|cycle| format!("[{}]", join_ids(cycle)))
            .collect::<Vec<_>>()
            .join(" ");
        message.push_str(&format!("; dependency cycles: {groups}"));
    }
    message
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub task_count: usize,
    pub root_count: usize,
    pub wave_count: usize,
    pub latest_finish: Option<NaiveDate>,
    pub latest_min_finish: Option<NaiveDate>,
    pub latest_max_finish: Option<NaiveDate>,
}

impl RefreshSummary {
    fn from_outcome(outcome: &PassOutcome) -> Self {
        let latest = |variant: Variant| {
            outcome
                .spans
                .values()
                .filter_map(|spans| spans.get(&variant))
                .map(|span| span.end_date())
                .max()
        };

        Self {
            task_count: outcome.spans.len(),
            root_count: outcome.waves.first().map_or(0, Vec::len),
            wave_count: outcome.waves.len(),
            latest_finish: latest(Variant::Nominal),
            latest_min_finish: latest(Variant::Min),
            latest_max_finish: latest(Variant::Max),
        }
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.task_count));
        parts.push(format!("roots={}", self.root_count));
        parts.push(format!("waves={}", self.wave_count));
        if let Some(date) = self.latest_finish {
            parts.push(format!("finish={}", date));
        }
        if let Some(date) = self.latest_min_finish {
            parts.push(format!("min_finish={}", date));
        }
        if let Some(date) = self.latest_max_finish {
            parts.push(format!("max_finish={}", date));
        }
        parts.join(", ")
    }
}

/// One output row: the task as ingested plus its computed dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub dependencies: String,
    pub duration: f64,
    pub min_duration: Option<f64>,
    pub max_duration: Option<f64>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub min_start: Option<NaiveDate>,
    pub min_end: Option<NaiveDate>,
    pub max_start: Option<NaiveDate>,
    pub max_end: Option<NaiveDate>,
}

impl ScheduledTask {
    fn from_task(task: &Task) -> Result<Self, ScheduleError> {
        let nominal = task.span(Variant::Nominal).ok_or(ScheduleError::Unresolved)?;
        let min = task.span(Variant::Min);
        let max = task.span(Variant::Max);
        Ok(Self {
            id: task.id().clone(),
            dependencies: task.raw_dependencies().to_string(),
            duration: task.duration(),
            min_duration: task.min_duration(),
            max_duration: task.max_duration(),
            start: nominal.start_date(),
            end: nominal.end_date(),
            min_start: min.map(|s| s.start_date()),
            min_end: min.map(|s| s.end_date()),
            max_start: max.map(|s| s.start_date()),
            max_end: max.map(|s| s.end_date()),
        })
    }
}

/// The resolved schedule as handed to serializers and stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub metadata: ScheduleMetadata,
    pub summary: RefreshSummary,
    pub tasks: Vec<ScheduledTask>,
}

pub struct Schedule {
    graph: TaskGraph,
    metadata: ScheduleMetadata,
    calendar: WorkCalendar,
    summary: Option<RefreshSummary>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::new_with_metadata(ScheduleMetadata::default())
    }

    pub fn new_with_metadata(metadata: ScheduleMetadata) -> Self {
        Self {
            graph: TaskGraph::new(),
            metadata,
            calendar: WorkCalendar::new(),
            summary: None,
        }
    }

    pub fn from_tasks<I>(metadata: ScheduleMetadata, tasks: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut schedule = Self::new_with_metadata(metadata);
        for task in tasks {
            schedule.add_task(task)?;
        }
        Ok(schedule)
    }

    pub fn add_task(&mut self, task: Task) -> Result<(), ScheduleError> {
        self.graph.add(task)?;
        Ok(())
    }

    pub fn metadata(&self) -> &ScheduleMetadata {
        &self.metadata
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.graph.get(id)
    }

    pub fn summary(&self) -> Option<&RefreshSummary> {
        self.summary.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.summary.is_some()
    }

    /// Seal the task graph, run the forward pass and store its spans on the
    /// tasks. Spans are applied to a copy of the graph that replaces the
    /// original only once every assignment succeeded, so a failed run leaves
    /// every task unscheduled.
    pub fn refresh(&mut self) -> Result<RefreshSummary, ScheduleError> {
        if self.summary.is_some() {
            return Err(ScheduleError::AlreadyResolved);
        }
        self.graph.seal();

        let engine = CalcForwardPass::new(&self.graph, &self.calendar);
        let outcome = engine.execute(self.metadata.project_start_date)?;

        let mut resolved = self.graph.clone();
        for (task_id, spans) in &outcome.spans {
            if let Some(task) = resolved.get_mut(task_id) {
                for (variant, span) in spans {
                    task.assign(*variant, *span)?;
                }
            }
        }
        self.graph = resolved;

        let summary = RefreshSummary::from_outcome(&outcome);
        info!(summary = %summary.to_cli_summary(), "schedule resolved");
        self.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Rows for every task in id order. Only available once resolved.
    pub fn report(&self) -> Result<ScheduleReport, ScheduleError> {
        let summary = self.summary.clone().ok_or(ScheduleError::Unresolved)?;
        let tasks = self
            .graph
            .tasks()
            .map(ScheduledTask::from_task)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScheduleReport {
            metadata: self.metadata.clone(),
            summary,
            tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_message_lists_tasks_and_cycles() {
        let err = ScheduleError::StalledPropagation {
            unresolved: vec![TaskId::from("1"), TaskId::from("2"), TaskId::from("3")],
            cycles: vec![vec![TaskId::from("1"), TaskId::from("2")]],
        };
        assert_eq!(
            err.to_string(),
            "no task could be scheduled; unresolved tasks: 1, 2, 3; dependency cycles: [1, 2]"
        );
    }

    #[test]
    fn refresh_runs_once() {
        let mut s = Schedule::new();
        s.add_task(Task::new("1", "", 1.0).unwrap()).unwrap();
        s.refresh().unwrap();
        assert_eq!(s.refresh(), Err(ScheduleError::AlreadyResolved));
    }

    #[test]
    fn report_requires_resolution() {
        let mut s = Schedule::new();
        s.add_task(Task::new("1", "", 1.0).unwrap()).unwrap();
        assert_eq!(s.report(), Err(ScheduleError::Unresolved));
    }

    #[test]
    fn failed_assignment_leaves_earlier_tasks_unscheduled() {
        let mut s = Schedule::new();
        s.add_task(Task::new("1", "", 1.0).unwrap()).unwrap();
        s.add_task(Task::new("2", "", 1.0).unwrap()).unwrap();

        let midnight = s.metadata().project_start_date.and_hms_opt(0, 0, 0).unwrap();
        let span = crate::task::ScheduleSpan {
            start: midnight,
            end: midnight,
        };
        s.graph
            .get_mut(&TaskId::from("2"))
            .unwrap()
            .assign(Variant::Nominal, span)
            .unwrap();

        assert_eq!(
            s.refresh(),
            Err(ScheduleError::Task(TaskError::AlreadyScheduled {
                task: TaskId::from("2"),
                variant: Variant::Nominal,
            }))
        );
        assert!(!s.task(&TaskId::from("1")).unwrap().is_scheduled());
        assert!(!s.is_resolved());
    }

    #[test]
    fn tasks_cannot_be_added_after_refresh() {
        let mut s = Schedule::new();
        s.add_task(Task::new("1", "", 1.0).unwrap()).unwrap();
        s.refresh().unwrap();
        assert!(matches!(
            s.add_task(Task::new("2", "1", 1.0).unwrap()),
            Err(ScheduleError::Graph(GraphError::Sealed(_)))
        ));
    }
}
