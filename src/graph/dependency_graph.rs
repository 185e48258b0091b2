use crate::ids::TaskId;
use crate::task::Task;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Directed view of the `dependency_id` links: an edge runs from the
/// dependency to the task that waits on it.
pub struct DependencyGraph {
    pub graph: DiGraph<TaskId, ()>,
    pub id_to_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    pub fn build(tasks: &[Task]) -> Self {
        let mut graph: DiGraph<TaskId, ()> = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());

        // Add nodes first
        for task in tasks {
            id_to_index
                .entry(task.id.clone())
                .or_insert_with(|| graph.add_node(task.id.clone()));
        }

        // Dangling references get no edge
        for task in tasks {
            if let Some(dependency_id) = task.dependency_id.as_ref() {
                if let (Some(&u), Some(&v)) =
                    (id_to_index.get(dependency_id), id_to_index.get(&task.id))
                {
                    graph.add_edge(u, v, ());
                }
            }
        }

        Self { graph, id_to_index }
    }

    /// Some task sitting on a dependency cycle, if there is one.
    pub fn find_cycle(&self) -> Option<TaskId> {
        toposort(&self.graph, None)
            .err()
            .map(|cycle| self.graph[cycle.node_id()].clone())
    }

    /// Whether making `task_id` depend on `dependency_id` would close a loop.
    pub fn would_close_cycle(&self, task_id: &TaskId, dependency_id: &TaskId) -> bool {
        if task_id == dependency_id {
            return true;
        }
        match (self.id_to_index.get(task_id), self.id_to_index.get(dependency_id)) {
            (Some(&task), Some(&dependency)) => {
                has_path_connecting(&self.graph, task, dependency, None)
            }
            _ => false,
        }
    }

    /// Tasks whose `dependency_id` is `task_id`.
    pub fn dependents(&self, task_id: &TaskId) -> Vec<TaskId> {
        let Some(&node) = self.id_to_index.get(task_id) else {
            return Vec::new();
        };
        let mut dependents: Vec<(NodeIndex, TaskId)> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| (n, self.graph[n].clone()))
            .collect();
        // neighbors come back newest-edge first
        dependents.sort_by_key(|(n, _)| n.index());
        dependents.into_iter().map(|(_, id)| id).collect()
    }
}
