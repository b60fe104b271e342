use crate::task::{DependencySpec, Task, TaskId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub mod schedule_dag;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),
    #[error("task graph is sealed, cannot add task {0}")]
    Sealed(TaskId),
    #[error("task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },
}

/// Owns every task of a run, keyed and iterated by [`TaskId`] order.
///
/// The graph is closed with [`TaskGraph::seal`] before resolution starts, so
/// the "all" dependency expands against a fixed set of ids.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskId, Task>,
    sealed: bool,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks<I>(tasks: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut graph = Self::new();
        for task in tasks {
            graph.add(task)?;
        }
        Ok(graph)
    }

    pub fn add(&mut self, task: Task) -> Result<(), GraphError> {
        if self.sealed {
            return Err(GraphError::Sealed(task.id().clone()));
        }
        if self.tasks.contains_key(task.id()) {
            return Err(GraphError::DuplicateTask(task.id().clone()));
        }
        self.tasks.insert(task.id().clone(), task);
        Ok(())
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.keys()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Ids `task` waits for. `AllOthers` expands to every other id currently
    /// in the graph, so call this only once ingestion is complete.
    pub fn resolve_dependency_ids(&self, task: &Task) -> BTreeSet<TaskId> {
        match task.dependencies() {
            DependencySpec::Explicit(ids) => ids.clone(),
            DependencySpec::AllOthers => self
                .tasks
                .keys()
                .filter(|id| *id != task.id())
                .cloned()
                .collect(),
        }
    }

    /// Every explicit dependency must name a task in the graph.
    pub fn validate_references(&self) -> Result<(), GraphError> {
        for task in self.tasks.values() {
            if let DependencySpec::Explicit(ids) = task.dependencies() {
                if let Some(missing) = ids.iter().find(|id| !self.tasks.contains_key(*id)) {
                    return Err(GraphError::UnknownDependency {
                        task: task.id().clone(),
                        dependency: missing.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
