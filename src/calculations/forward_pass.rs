use crate::calendar::WorkCalendar;
use crate::graph::TaskGraph;
use crate::graph::schedule_dag::ScheduleDag;
use crate::schedule::ScheduleError;
use crate::task::{ScheduleSpan, Task, TaskId, Variant};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Spans computed for one task, one per variant it carries.
pub type TaskSpans = BTreeMap<Variant, ScheduleSpan>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutcome {
    pub spans: BTreeMap<TaskId, TaskSpans>,
    /// Tasks in the order they became resolvable. The first wave holds the
    /// tasks without dependencies; every later wave holds the tasks whose last
    /// dependency resolved in the wave before it.
    pub waves: Vec<Vec<TaskId>>,
}

/// Earliest-start propagation over a sealed [`TaskGraph`].
///
/// Every task counts its unresolved dependencies. Once a wave is resolved the
/// counters of its dependents drop, and the tasks reaching zero form the next
/// wave. Tasks of one wave only read spans from earlier waves, so a wave is
/// computed in parallel and merged in id order.
pub struct ForwardPass<'a> {
    graph: &'a TaskGraph,
    calendar: &'a WorkCalendar,
}

impl<'a> ForwardPass<'a> {
    pub fn new(graph: &'a TaskGraph, calendar: &'a WorkCalendar) -> Self {
        Self { graph, calendar }
    }

    pub fn execute(&self, project_start: NaiveDate) -> Result<PassOutcome, ScheduleError> {
        self.graph.validate_references()?;

        if !self.calendar.is_working_day(project_start) {
            warn!(%project_start, "project start date falls on a weekend");
        }
        let project_start = project_start.and_time(NaiveTime::MIN);

        let tasks: Vec<&Task> = self.graph.tasks().collect();
        let index: HashMap<&TaskId, usize> = tasks
            .iter()
            .enumerate()
            .map(|(ix, task)| (task.id(), ix))
            .collect();

        let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(tasks.len());
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
        for (ix, task) in tasks.iter().enumerate() {
            let deps: Vec<usize> = self
                .graph
                .resolve_dependency_ids(task)
                .iter()
                .filter_map(|id| index.get(id).copied())
                .collect();
            for &dep in &deps {
                dependents[dep].push(ix);
            }
            dependencies.push(deps);
        }

        let mut remaining: Vec<usize> = dependencies.iter().map(Vec::len).collect();
        let mut spans: Vec<Option<TaskSpans>> = vec![None; tasks.len()];
        let mut waves: Vec<Vec<TaskId>> = Vec::new();

        let mut wave: Vec<usize> = (0..tasks.len()).filter(|&ix| remaining[ix] == 0).collect();

        while !wave.is_empty() {
            // No schedule needs more waves than it has tasks.
            if waves.len() >= tasks.len() {
                return Err(self.stalled(&tasks, &spans));
            }

            let resolved: Vec<(usize, TaskSpans)> = wave
                .par_iter()
                .map(|&ix| {
                    self.resolve_task(tasks[ix], &dependencies[ix], &tasks, &spans, project_start)
                        .map(|task_spans| (ix, task_spans))
                })
                .collect::<Result<_, _>>()?;

            let mut next = Vec::new();
            for (ix, task_spans) in resolved {
                if let Some(span) = task_spans.get(&Variant::Nominal) {
                    debug!(task = %tasks[ix].id(), start = %span.start, end = %span.end, "resolved task");
                }
                spans[ix] = Some(task_spans);
                for &dependent in &dependents[ix] {
                    remaining[dependent] -= 1;
                    if remaining[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            next.sort_unstable();

            info!(wave = waves.len(), tasks = wave.len(), "resolved wave");
            waves.push(wave.iter().map(|&ix| tasks[ix].id().clone()).collect());
            wave = next;
        }

        if spans.iter().any(Option::is_none) {
            return Err(self.stalled(&tasks, &spans));
        }

        let spans = tasks
            .iter()
            .zip(spans)
            .filter_map(|(task, task_spans)| task_spans.map(|s| (task.id().clone(), s)))
            .collect();

        Ok(PassOutcome { spans, waves })
    }

    /// Compute every span of `task` from the spans of its resolved
    /// dependencies. Tasks without dependencies start at `project_start`.
    fn resolve_task(
        &self,
        task: &Task,
        dependencies: &[usize],
        tasks: &[&Task],
        spans: &[Option<TaskSpans>],
        project_start: NaiveDateTime,
    ) -> Result<TaskSpans, ScheduleError> {
        let mut task_spans = TaskSpans::new();

        for variant in task.variants() {
            let Some(effort) = task.effort(variant) else {
                continue;
            };

            let mut start = project_start;
            for (position, &dep) in dependencies.iter().enumerate() {
                let dep_end = spans[dep]
                    .as_ref()
                    .and_then(|dep_spans| dep_spans.get(&variant))
                    .map(|span| span.end)
                    .ok_or_else(|| ScheduleError::MissingDurationVariant {
                        task: task.id().clone(),
                        dependency: tasks[dep].id().clone(),
                        variant,
                    })?;
                if position == 0 || dep_end > start {
                    start = dep_end;
                }
            }

            let end = self
                .calendar
                .compute_end(start, effort)
                .map_err(|source| ScheduleError::Calendar {
                    task: task.id().clone(),
                    source,
                })?;
            task_spans.insert(variant, ScheduleSpan { start, end });
        }

        Ok(task_spans)
    }

    fn stalled(&self, tasks: &[&Task], spans: &[Option<TaskSpans>]) -> ScheduleError {
        let unresolved: Vec<TaskId> = tasks
            .iter()
            .zip(spans)
            .filter(|(_, task_spans)| task_spans.is_none())
            .map(|(task, _)| task.id().clone())
            .collect();
        let cycles = ScheduleDag::build(self.graph).cycles();
        warn!(
            unresolved = unresolved.len(),
            cycles = cycles.len(),
            "propagation stalled"
        );
        ScheduleError::StalledPropagation { unresolved, cycles }
    }
}
