use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Dependency token meaning "every other task in the graph".
pub const ALL_DEPENDENCIES_TOKEN: &str = "all";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error("task {task} has invalid {variant} duration {value} (must be finite and >= 0)")]
    InvalidDuration {
        task: TaskId,
        variant: Variant,
        value: f64,
    },
    #[error("task {task} supplies only one of min/max duration (min={min:?}, max={max:?})")]
    InconsistentDurationVariant {
        task: TaskId,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error("malformed dependency list '{raw}': 'all' cannot be combined with task ids")]
    MalformedDependencies { raw: String },
    #[error("task {task} already has a {variant} schedule")]
    AlreadyScheduled { task: TaskId, variant: Variant },
    #[error("task {task} has no {variant} duration to schedule")]
    MissingEffortRange { task: TaskId, variant: Variant },
}

/// Opaque task identifier.
///
/// Ids that parse as integers order by numeric value and come before all
/// other ids; the raw text breaks ties so ordering stays consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric_value(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for TaskId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_value(), other.numeric_value()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What a task waits for before it can start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpec {
    Explicit(BTreeSet<TaskId>),
    /// Every other task in the graph, expanded once the graph is sealed.
    AllOthers,
}

impl DependencySpec {
    pub fn none() -> Self {
        Self::Explicit(BTreeSet::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Explicit(ids) if ids.is_empty())
    }

    /// Parse a comma-separated id list, the `all` token, or an empty string.
    /// Blank segments (e.g. a trailing comma) are ignored.
    pub fn parse(raw: &str) -> Result<Self, TaskError> {
        let segments: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();

        if segments.contains(&ALL_DEPENDENCIES_TOKEN) {
            return if segments.len() == 1 {
                Ok(Self::AllOthers)
            } else {
                Err(TaskError::MalformedDependencies {
                    raw: raw.to_string(),
                })
            };
        }

        Ok(Self::Explicit(
            segments.into_iter().map(TaskId::from).collect(),
        ))
    }
}

impl FromStr for DependencySpec {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The three parallel schedules a task can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Nominal,
    Min,
    Max,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Nominal, Variant::Min, Variant::Max];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Nominal => "nominal",
            Variant::Min => "min",
            Variant::Max => "max",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimistic and pessimistic effort in effort-days. Always supplied together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffortRange {
    pub min: f64,
    pub max: f64,
}

/// A computed start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ScheduleSpan {
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    dependencies: DependencySpec,
    raw_dependencies: String,
    duration: f64,
    range: Option<EffortRange>,
    nominal: Option<ScheduleSpan>,
    min: Option<ScheduleSpan>,
    max: Option<ScheduleSpan>,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        dependencies: &str,
        duration: f64,
    ) -> Result<Self, TaskError> {
        let id = id.into();
        check_effort(&id, Variant::Nominal, duration)?;
        Ok(Self {
            dependencies: DependencySpec::parse(dependencies)?,
            raw_dependencies: dependencies.to_string(),
            id,
            duration,
            range: None,
            nominal: None,
            min: None,
            max: None,
        })
    }

    /// Build a task from optional min/max efforts, rejecting records that
    /// supply only one of the two.
    pub fn from_parts(
        id: impl Into<TaskId>,
        dependencies: &str,
        duration: f64,
        min_duration: Option<f64>,
        max_duration: Option<f64>,
    ) -> Result<Self, TaskError> {
        let task = Self::new(id, dependencies, duration)?;
        match (min_duration, max_duration) {
            (None, None) => Ok(task),
            (Some(min), Some(max)) => task.with_range(min, max),
            (min, max) => Err(TaskError::InconsistentDurationVariant {
                task: task.id,
                min,
                max,
            }),
        }
    }

    pub fn with_range(mut self, min_duration: f64, max_duration: f64) -> Result<Self, TaskError> {
        check_effort(&self.id, Variant::Min, min_duration)?;
        check_effort(&self.id, Variant::Max, max_duration)?;
        self.range = Some(EffortRange {
            min: min_duration,
            max: max_duration,
        });
        Ok(self)
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn dependencies(&self) -> &DependencySpec {
        &self.dependencies
    }

    /// Dependency text exactly as it was supplied.
    pub fn raw_dependencies(&self) -> &str {
        &self.raw_dependencies
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn range(&self) -> Option<EffortRange> {
        self.range
    }

    pub fn min_duration(&self) -> Option<f64> {
        self.range.map(|r| r.min)
    }

    pub fn max_duration(&self) -> Option<f64> {
        self.range.map(|r| r.max)
    }

    /// Effort driving the given schedule, if the task carries that variant.
    pub fn effort(&self, variant: Variant) -> Option<f64> {
        match variant {
            Variant::Nominal => Some(self.duration),
            Variant::Min => self.min_duration(),
            Variant::Max => self.max_duration(),
        }
    }

    /// Variants this task is scheduled against, nominal first.
    pub fn variants(&self) -> impl Iterator<Item = Variant> + '_ {
        Variant::ALL
            .into_iter()
            .filter(|variant| self.effort(*variant).is_some())
    }

    pub fn span(&self, variant: Variant) -> Option<&ScheduleSpan> {
        match variant {
            Variant::Nominal => self.nominal.as_ref(),
            Variant::Min => self.min.as_ref(),
            Variant::Max => self.max.as_ref(),
        }
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.nominal.map(|s| s.start)
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.nominal.map(|s| s.end)
    }

    pub fn is_scheduled(&self) -> bool {
        self.nominal.is_some()
    }

    /// Record a computed span. Each span is written at most once.
    pub(crate) fn assign(&mut self, variant: Variant, span: ScheduleSpan) -> Result<(), TaskError> {
        if self.effort(variant).is_none() {
            return Err(TaskError::MissingEffortRange {
                task: self.id.clone(),
                variant,
            });
        }
        let slot = match variant {
            Variant::Nominal => &mut self.nominal,
            Variant::Min => &mut self.min,
            Variant::Max => &mut self.max,
        };
        if slot.is_some() {
            return Err(TaskError::AlreadyScheduled {
                task: self.id.clone(),
                variant,
            });
        }
        *slot = Some(span);
        Ok(())
    }
}

fn check_effort(task: &TaskId, variant: Variant, value: f64) -> Result<(), TaskError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TaskError::InvalidDuration {
            task: task.clone(),
            variant,
            value,
        })
    }
}
