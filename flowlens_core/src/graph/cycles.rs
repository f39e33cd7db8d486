//! Cycle detection over the stage graph
//!
//! Depth-first traversal from every unvisited stage with an explicit
//! recursion stack. When the traversal revisits a stage that is still on the
//! stack, the sub-path from that stage to the current position is emitted as
//! a cycle. Stages that finished exploration are never re-explored, so the
//! whole pass is O(V+E) per root and every reachable directed cycle is
//! reported at least once.

use std::collections::HashSet;

use super::StageGraph;

impl StageGraph {
    /// Detect all directed cycles in the stage graph.
    ///
    /// Each cycle is the stage-id path from the first repeated stage up to
    /// the stage that closed the loop; a self-loop yields a cycle of
    /// length 1. Disjoint cycles are all reported; a stage participating in
    /// several cycles may appear in only one of them.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut finished: HashSet<&str> = HashSet::new();

        for root in self.stage_ids() {
            if finished.contains(root) {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            let mut on_stack: HashSet<&str> = HashSet::new();
            self.dfs_cycles(root, &mut path, &mut on_stack, &mut finished, &mut cycles);
        }

        cycles
    }

    fn dfs_cycles<'a>(
        &'a self,
        current: &'a str,
        path: &mut Vec<&'a str>,
        on_stack: &mut HashSet<&'a str>,
        finished: &mut HashSet<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        path.push(current);
        on_stack.insert(current);

        for (next, _) in self.outgoing(current) {
            if on_stack.contains(next) {
                // Found a back edge: the cycle is the path suffix starting
                // at the repeated stage.
                if let Some(pos) = path.iter().position(|&s| s == next) {
                    cycles.push(path[pos..].iter().map(|s| s.to_string()).collect());
                }
            } else if !finished.contains(next) {
                self.dfs_cycles(next, path, on_stack, finished, cycles);
            }
        }

        path.pop();
        on_stack.remove(current);
        finished.insert(current);
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_support::*;
    use crate::graph::StageGraph;
    use crate::model::DependencyKind;

    #[test]
    fn test_acyclic_graph_reports_no_cycles() {
        let wf = workflow(
            vec![stage("a"), stage("b"), stage("c"), stage("d")],
            vec![
                dep("a", "b", DependencyKind::Sequential),
                dep("a", "c", DependencyKind::Conditional),
                dep("b", "d", DependencyKind::Sequential),
                dep("c", "d", DependencyKind::Sequential),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);
        assert!(graph.detect_cycles().is_empty());
    }

    #[test]
    fn test_three_cycle_detected_without_repeats() {
        let wf = workflow(
            vec![stage("a"), stage("b"), stage("c")],
            vec![
                dep("a", "b", DependencyKind::Sequential),
                dep("b", "c", DependencyKind::Sequential),
                dep("c", "a", DependencyKind::Sequential),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);
        let cycles = graph.detect_cycles();

        assert_eq!(cycles.len(), 1);
        let cycle = &cycles[0];
        assert!(cycle.len() <= 3);
        // No stage repeats before the first repetition closes the loop.
        let unique: std::collections::HashSet<_> = cycle.iter().collect();
        assert_eq!(unique.len(), cycle.len());
    }

    #[test]
    fn test_self_loop_is_length_one_cycle() {
        let wf = workflow(
            vec![stage("a")],
            vec![dep("a", "a", DependencyKind::Sequential)],
        );
        let graph = StageGraph::from_workflow(&wf);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_disjoint_cycles_both_reported() {
        let wf = workflow(
            vec![stage("a"), stage("b"), stage("x"), stage("y"), stage("z")],
            vec![
                dep("a", "b", DependencyKind::Sequential),
                dep("b", "a", DependencyKind::Sequential),
                dep("x", "y", DependencyKind::Sequential),
                dep("y", "z", DependencyKind::Sequential),
                dep("z", "x", DependencyKind::Sequential),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn test_cycle_reachable_behind_chain_is_found() {
        // entry -> a -> b -> a
        let wf = workflow(
            vec![stage("entry"), stage("a"), stage("b")],
            vec![
                dep("entry", "a", DependencyKind::Sequential),
                dep("a", "b", DependencyKind::Sequential),
                dep("b", "a", DependencyKind::Sequential),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);
        let cycles = graph.detect_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);
        assert!(!cycles[0].contains(&"entry".to_string()));
    }
}
