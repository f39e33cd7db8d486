//! Alternative perspectives
//!
//! One fixed narrative per improvement kind present in the optimization
//! output, plus graph-level alternatives for very large or very dense
//! workflows.

use flowlens_core::{
    AlternativePerspective, GraphSummary, IdGen, ImprovementKind, OptimizationOutput,
};

use crate::config::AnalysisThresholds;

fn kind_perspective(kind: ImprovementKind) -> (&'static str, &'static str) {
    match kind {
        ImprovementKind::Architecture => (
            "Event-driven choreography",
            "Instead of restructuring the dependency graph, let stages react to events: each stage publishes what it produced and downstream stages subscribe. The graph disappears into the event contracts.",
        ),
        ImprovementKind::Performance => (
            "Measure before optimizing",
            "Run the workflow unchanged with per-stage timing first. Optimization advice based on structure alone routinely targets stages that cost nothing in practice.",
        ),
        ImprovementKind::Reliability => (
            "Graceful degradation over redundancy",
            "Rather than duplicating stages, define what a partial result looks like and let the workflow complete degraded. Redundancy buys availability; degradation buys it cheaper.",
        ),
        ImprovementKind::Cost => (
            "Scheduling windows over right-sizing",
            "Before resizing resources, move flexible work into cheaper execution windows. The same stages at a different hour may be the whole saving.",
        ),
        ImprovementKind::Maintainability => (
            "Conventions over tooling",
            "Instead of consolidating stages or definitions, agree on naming and structure conventions and enforce them in review. Most maintainability pain is inconsistency, not volume.",
        ),
    }
}

pub(super) fn alternatives(
    summary: &GraphSummary,
    optimization: &OptimizationOutput,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<AlternativePerspective> {
    let mut perspectives = Vec::new();

    for kind in ImprovementKind::ALL {
        if optimization.improvements.iter().any(|i| i.kind == kind) {
            let (title, narrative) = kind_perspective(kind);
            perspectives.push(AlternativePerspective {
                id: ids.next("alt"),
                title: title.to_string(),
                narrative: narrative.to_string(),
            });
        }
    }

    if summary.stage_count > thresholds.shallow_stage_count {
        perspectives.push(AlternativePerspective {
            id: ids.next("alt"),
            title: "Coarser-grained stages".to_string(),
            narrative: format!(
                "With {} stages, consider whether the workflow models the process or its org chart. A handful of coarse stages with clear contracts often outperforms many thin ones.",
                summary.stage_count
            ),
        });
    }

    if summary.dependency_ratio > thresholds.critic_dense_ratio {
        perspectives.push(AlternativePerspective {
            id: ids.next("alt"),
            title: "Choreography over central ordering".to_string(),
            narrative: "A graph this dense is doing the scheduler's job by hand. Let data availability drive execution and keep only the dependencies that encode real prerequisites."
                .to_string(),
        });
    }

    perspectives
}
