//! Graph analysis toolkit
//!
//! Pure structural queries over the workflow graph: cycle detection, chain
//! discovery, parallelization candidates, reachability and resource
//! contention grouping. No state is kept beyond the adjacency structure
//! built once per analyzed graph.

mod chains;
mod contention;
mod cycles;

pub use contention::ContentionGroup;

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::model::{DependencyKind, WorkflowGraph};

/// Adjacency view over a [`WorkflowGraph`].
///
/// Edge direction follows the dependency direction: an edge `from -> to`
/// means `to` runs after `from`. Node iteration order is the stage
/// declaration order, which keeps every toolkit result deterministic.
pub struct StageGraph {
    graph: DiGraph<String, DependencyKind>,
    node_indices: IndexMap<String, NodeIndex>,
    /// resource id -> stages declaring it, in declaration order
    resource_users: IndexMap<String, Vec<String>>,
}

impl StageGraph {
    /// Build the adjacency structure from a validated workflow graph.
    ///
    /// Inline `depends_on` declarations are merged with the explicit
    /// dependency list as sequential edges; endpoints that reference unknown
    /// stages are skipped (validation upstream reports them).
    pub fn from_workflow(workflow: &WorkflowGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = IndexMap::new();
        let mut resource_users: IndexMap<String, Vec<String>> = IndexMap::new();

        for stage in &workflow.stages {
            if node_indices.contains_key(&stage.id) {
                continue;
            }
            let idx = graph.add_node(stage.id.clone());
            node_indices.insert(stage.id.clone(), idx);
            for resource in &stage.resources {
                resource_users
                    .entry(resource.clone())
                    .or_default()
                    .push(stage.id.clone());
            }
        }

        for dep in &workflow.dependencies {
            let (Some(&from), Some(&to)) =
                (node_indices.get(&dep.from), node_indices.get(&dep.to))
            else {
                continue;
            };
            graph.add_edge(from, to, dep.kind);
        }

        for stage in &workflow.stages {
            let Some(&to) = node_indices.get(&stage.id) else {
                continue;
            };
            for dep_id in &stage.depends_on {
                let Some(&from) = node_indices.get(dep_id) else {
                    continue;
                };
                if graph.find_edge(from, to).is_none() {
                    graph.add_edge(from, to, DependencyKind::Sequential);
                }
            }
        }

        Self {
            graph,
            node_indices,
            resource_users,
        }
    }

    /// Stage ids in declaration order
    pub fn stage_ids(&self) -> Vec<&str> {
        self.node_indices.keys().map(String::as_str).collect()
    }

    pub fn stage_count(&self) -> usize {
        self.graph.node_count()
    }

    fn idx(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Outgoing edges as (target stage id, edge kind)
    pub fn outgoing(&self, id: &str) -> Vec<(&str, DependencyKind)> {
        let Some(idx) = self.idx(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()].as_str(), *e.weight()))
            .collect()
    }

    /// Incoming edges as (source stage id, edge kind)
    pub fn incoming(&self, id: &str) -> Vec<(&str, DependencyKind)> {
        let Some(idx) = self.idx(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (self.graph[e.source()].as_str(), *e.weight()))
            .collect()
    }

    pub fn outgoing_count(&self, id: &str) -> usize {
        self.idx(id)
            .map(|idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn incoming_count(&self, id: &str) -> usize {
        self.idx(id)
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Breadth-first reachability over outgoing edges
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        let (Some(start), Some(goal)) = (self.idx(from), self.idx(to)) else {
            return false;
        };
        if start == goal {
            return true;
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if neighbor == goal {
                    return true;
                }
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        false
    }

    /// Two stages are in a dependency chain if either is reachable from the
    /// other.
    pub fn in_dependency_chain(&self, a: &str, b: &str) -> bool {
        self.is_reachable(a, b) || self.is_reachable(b, a)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use crate::model::{
        Dependency, DependencyKind, GraphMetadata, Stage, StageKind, WorkflowGraph,
    };

    pub fn stage(id: &str) -> Stage {
        Stage {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            kind: StageKind::Task,
            config: BTreeMap::new(),
            depends_on: Vec::new(),
            resources: Vec::new(),
            retry_policy: None,
        }
    }

    pub fn dep(from: &str, to: &str, kind: DependencyKind) -> Dependency {
        Dependency {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            condition: None,
        }
    }

    pub fn workflow(stages: Vec<Stage>, dependencies: Vec<Dependency>) -> WorkflowGraph {
        WorkflowGraph {
            stages,
            dependencies,
            triggers: Vec::new(),
            resources: Vec::new(),
            metadata: GraphMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_reachability_follows_edge_direction() {
        let wf = workflow(
            vec![stage("a"), stage("b"), stage("c")],
            vec![
                dep("a", "b", DependencyKind::Sequential),
                dep("b", "c", DependencyKind::Data),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);

        assert!(graph.is_reachable("a", "c"));
        assert!(!graph.is_reachable("c", "a"));
        assert!(graph.in_dependency_chain("c", "a"));
    }

    #[test]
    fn test_depends_on_merged_as_sequential_edges() {
        let mut b = stage("b");
        b.depends_on.push("a".to_string());
        let wf = workflow(vec![stage("a"), b], Vec::new());
        let graph = StageGraph::from_workflow(&wf);

        assert_eq!(graph.outgoing("a"), vec![("b", DependencyKind::Sequential)]);
        assert_eq!(graph.incoming_count("b"), 1);
    }

    #[test]
    fn test_unknown_endpoints_skipped() {
        let wf = workflow(
            vec![stage("a")],
            vec![dep("a", "ghost", DependencyKind::Sequential)],
        );
        let graph = StageGraph::from_workflow(&wf);
        assert_eq!(graph.outgoing_count("a"), 0);
    }

    #[test]
    fn test_stage_ids_keep_declaration_order() {
        let wf = workflow(vec![stage("z"), stage("a"), stage("m")], Vec::new());
        let graph = StageGraph::from_workflow(&wf);
        assert_eq!(graph.stage_ids(), vec!["z", "a", "m"]);
    }
}
