//! Bottleneck detection pass
//!
//! Three structural sources: long sequential chains, contended shared
//! resources and high fan-in merge points.

use flowlens_core::{Bottleneck, BottleneckKind, IdGen, Impact, StageGraph};

use crate::config::AnalysisThresholds;

pub(super) fn detect_bottlenecks(
    graph: &StageGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();
    bottlenecks.extend(chain_bottlenecks(graph, thresholds, ids));
    bottlenecks.extend(resource_bottlenecks(graph, thresholds, ids));
    bottlenecks.extend(fan_in_bottlenecks(graph, thresholds, ids));
    bottlenecks
}

fn chain_bottlenecks(
    graph: &StageGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<Bottleneck> {
    let candidates = graph.parallelization_candidates();
    let mut bottlenecks = Vec::new();

    for chain in graph.sequential_chains() {
        if chain.len() < thresholds.chain_bottleneck_len {
            continue;
        }
        let impact = if chain.len() >= thresholds.chain_high_impact_len {
            Impact::High
        } else {
            Impact::Medium
        };

        let mut suggestions = vec![
            "Run independent steps of this chain in parallel".to_string(),
            "Split the chain into smaller stages with explicit checkpoints".to_string(),
        ];
        // The chain discovery already found the segment; a matching
        // parallelization candidate means pipelining applies directly.
        if candidates
            .iter()
            .any(|c| c.iter().all(|id| chain.contains(id)))
        {
            suggestions.push(
                "Introduce pipelining so later items start before earlier stages drain"
                    .to_string(),
            );
        }

        bottlenecks.push(Bottleneck {
            id: ids.next("btl"),
            kind: BottleneckKind::Sequential,
            description: format!(
                "Sequential chain of {} stages; total latency is the sum of all of them",
                chain.len()
            ),
            affected_stages: chain,
            impact,
            suggestions,
        });
    }

    bottlenecks
}

fn resource_bottlenecks(
    graph: &StageGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<Bottleneck> {
    graph
        .resource_contention_groups()
        .into_iter()
        .map(|group| {
            let impact = if group.stages.len() > thresholds.resource_group_high_impact {
                Impact::High
            } else {
                Impact::Medium
            };
            Bottleneck {
                id: ids.next("btl"),
                kind: BottleneckKind::Resource,
                description: format!(
                    "{} concurrent stages compete for resource '{}'",
                    group.stages.len(),
                    group.resource_id
                ),
                affected_stages: group.stages,
                impact,
                suggestions: vec![
                    format!("Raise the capacity of '{}'", group.resource_id),
                    "Serialize access behind a queue if capacity cannot grow".to_string(),
                ],
            }
        })
        .collect()
}

fn fan_in_bottlenecks(
    graph: &StageGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<Bottleneck> {
    let mut bottlenecks = Vec::new();

    for id in graph.stage_ids() {
        let incoming = graph.incoming(id);
        if incoming.len() < thresholds.fan_in_bottleneck {
            continue;
        }
        let impact = if incoming.len() >= thresholds.fan_in_high_impact {
            Impact::High
        } else {
            Impact::Medium
        };

        let mut sources: Vec<String> = incoming.iter().map(|(s, _)| s.to_string()).collect();
        sources.sort();
        let mut affected = vec![id.to_string()];
        affected.extend(sources);

        bottlenecks.push(Bottleneck {
            id: ids.next("btl"),
            kind: BottleneckKind::Dependency,
            description: format!(
                "Stage '{}' waits on {} upstream stages; the slowest one gates it",
                id,
                incoming.len()
            ),
            affected_stages: affected,
            impact,
            suggestions: vec![
                "Let the stage start on partial input where possible".to_string(),
                "Group upstream stages so the merge point waits on fewer edges".to_string(),
            ],
        });
    }

    bottlenecks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{chain_workflow, dep, stage, workflow};
    use flowlens_core::StageGraph;

    fn thresholds() -> AnalysisThresholds {
        AnalysisThresholds::default()
    }

    #[test]
    fn test_chain_of_five_is_medium_impact() {
        let wf = chain_workflow(5);
        let graph = StageGraph::from_workflow(&wf);
        let found = detect_bottlenecks(&graph, &thresholds(), &mut IdGen::new());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, BottleneckKind::Sequential);
        assert_eq!(found[0].impact, Impact::Medium);
        assert_eq!(found[0].affected_stages.len(), 5);
        assert!(found[0].suggestions.len() >= 3);
    }

    #[test]
    fn test_chain_of_six_is_high_impact() {
        let wf = chain_workflow(6);
        let graph = StageGraph::from_workflow(&wf);
        let found = detect_bottlenecks(&graph, &thresholds(), &mut IdGen::new());
        assert_eq!(found[0].impact, Impact::High);
    }

    #[test]
    fn test_chain_of_three_not_reported() {
        let wf = chain_workflow(3);
        let graph = StageGraph::from_workflow(&wf);
        assert!(detect_bottlenecks(&graph, &thresholds(), &mut IdGen::new()).is_empty());
    }

    #[test]
    fn test_fan_in_of_four_reported() {
        let mut stages = vec![stage("sink")];
        let mut deps = Vec::new();
        for i in 0..4 {
            let id = format!("src{i}");
            stages.push(stage(&id));
            deps.push(dep(&id, "sink"));
        }
        let wf = workflow(stages, deps);
        let graph = StageGraph::from_workflow(&wf);
        let found = detect_bottlenecks(&graph, &thresholds(), &mut IdGen::new());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, BottleneckKind::Dependency);
        assert_eq!(found[0].impact, Impact::Medium);
        assert_eq!(found[0].affected_stages[0], "sink");
    }

    #[test]
    fn test_contended_resource_reported() {
        let mut wf = workflow(
            vec![stage("a"), stage("b"), stage("c")],
            Vec::new(),
        );
        for s in &mut wf.stages {
            s.resources.push("gpu".to_string());
        }
        let graph = StageGraph::from_workflow(&wf);
        let found = detect_bottlenecks(&graph, &thresholds(), &mut IdGen::new());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, BottleneckKind::Resource);
        assert_eq!(found[0].impact, Impact::Medium);
    }
}
