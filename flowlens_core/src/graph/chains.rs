//! Sequential chain discovery and parallelization candidates
//!
//! Chain discovery is deliberately conservative: a chain extends only while
//! the current stage has exactly one outgoing *sequential* dependency and
//! the next stage has exactly one incoming dependency of any kind, so any
//! branching or merging breaks the chain. This under-approximates real
//! chains but never reports a false one.

use std::collections::HashSet;

use crate::model::DependencyKind;

use super::StageGraph;

impl StageGraph {
    /// Discover maximal sequential chains.
    ///
    /// Chains of length <= 1 are discarded. A stage with more than one
    /// incoming dependency can only ever appear as a chain's first element.
    pub fn sequential_chains(&self) -> Vec<Vec<String>> {
        let mut chains = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();

        for start in self.stage_ids() {
            if visited.contains(start) {
                continue;
            }
            visited.insert(start);
            let mut chain = vec![start];
            let mut current = start;

            loop {
                let sequential_out: Vec<&str> = self
                    .outgoing(current)
                    .into_iter()
                    .filter(|(_, kind)| *kind == DependencyKind::Sequential)
                    .map(|(target, _)| target)
                    .collect();
                if sequential_out.len() != 1 {
                    break;
                }
                let next = sequential_out[0];
                if self.incoming_count(next) != 1 || visited.contains(next) {
                    break;
                }
                visited.insert(next);
                chain.push(next);
                current = next;
            }

            if chain.len() > 1 {
                chains.push(chain.into_iter().map(|s| s.to_string()).collect());
            }
        }

        chains
    }

    /// Flag contiguous chain segments suitable for pipeline parallelism.
    ///
    /// A candidate is a sub-segment of length >= 3 of a discovered chain
    /// where every adjacent pair is linked by a sequential dependency.
    pub fn parallelization_candidates(&self) -> Vec<Vec<String>> {
        let mut candidates = Vec::new();

        for chain in self.sequential_chains() {
            let mut segment: Vec<String> = Vec::new();
            for window_start in 0..chain.len() {
                if segment.is_empty() {
                    segment.push(chain[window_start].clone());
                    continue;
                }
                let prev = segment.last().expect("segment is non-empty");
                if self.has_sequential_edge(prev, &chain[window_start]) {
                    segment.push(chain[window_start].clone());
                } else {
                    if segment.len() >= 3 {
                        candidates.push(std::mem::take(&mut segment));
                    } else {
                        segment.clear();
                    }
                    segment.push(chain[window_start].clone());
                }
            }
            if segment.len() >= 3 {
                candidates.push(segment);
            }
        }

        candidates
    }

    fn has_sequential_edge(&self, from: &str, to: &str) -> bool {
        self.outgoing(from)
            .into_iter()
            .any(|(target, kind)| target == to && kind == DependencyKind::Sequential)
    }
}
