use super::TaskGraph;
use crate::task::TaskId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// petgraph view of a [`TaskGraph`] with edges pointing from a dependency to
/// the task that waits for it. Used to explain stalled propagation.
pub struct ScheduleDag {
    pub graph: DiGraph<TaskId, ()>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl ScheduleDag {
    pub fn build(tasks: &TaskGraph) -> Self {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::new();

        // Add nodes first
        for id in tasks.ids() {
            let node_ix = graph.add_node(id.clone());
            id_to_index.insert(id.clone(), node_ix);
        }

        // Add edges: dependency -> task; unknown ids have no node to point from
        for task in tasks.tasks() {
            let task_ix = id_to_index[task.id()];
            for dep_id in tasks.resolve_dependency_ids(task) {
                if let Some(&dep_ix) = id_to_index.get(&dep_id) {
                    graph.add_edge(dep_ix, task_ix, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Groups of tasks that wait on each other, including tasks that wait on
    /// themselves. Members and groups are in [`TaskId`] order.
    pub fn cycles(&self) -> Vec<Vec<TaskId>> {
        let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.find_edge(component[0], component[0]).is_some()
            })
            .map(|component| {
                let mut ids: Vec<TaskId> = component
                    .into_iter()
                    .map(|ix| self.graph[ix].clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
