//! Assumption challenges
//!
//! Two scopes: assumptions baked into the input graph itself, and
//! assumptions the upstream stages made when they produced their findings.

use flowlens_core::{
    AssumptionScope, ChallengedAssumption, GraphSummary, IdGen, OptimizationOutput, Priority,
    RiskOutput, Severity,
};

use crate::config::AnalysisThresholds;

pub(super) fn challenge_input(
    summary: &GraphSummary,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<ChallengedAssumption> {
    let mut challenged = Vec::new();

    if summary.stage_count > thresholds.critic_many_stages {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::InputGraph,
            assumption: format!("All {} stages are necessary", summary.stage_count),
            challenge: "Workflows accrete stages; audit which ones still earn their place"
                .to_string(),
        });
    }

    if summary.dependency_ratio > thresholds.critic_dense_ratio {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::InputGraph,
            assumption: format!(
                "Every one of the {:.1} dependencies per stage reflects a real ordering constraint",
                summary.dependency_ratio
            ),
            challenge: "Dense graphs usually encode habit, not data flow; many edges can go"
                .to_string(),
        });
    }

    if summary.resource_count > thresholds.critic_many_resources {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::InputGraph,
            assumption: format!("{} distinct resources are required", summary.resource_count),
            challenge: "Each declared resource is an operational dependency; consolidate where capacities overlap"
                .to_string(),
        });
    }

    if summary.trigger_count > thresholds.critic_many_triggers {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::InputGraph,
            assumption: format!("{} triggers all need to start this workflow", summary.trigger_count),
            challenge: "Multiple entry points multiply the states the workflow can start from"
                .to_string(),
        });
    }

    challenged
}

pub(super) fn challenge_output(
    risk: &RiskOutput,
    optimization: &OptimizationOutput,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<ChallengedAssumption> {
    let mut challenged = Vec::new();

    let high_risks = risk
        .risks
        .iter()
        .filter(|r| r.severity >= Severity::High)
        .count();
    if high_risks > thresholds.critic_many_high_risks {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::AnalysisOutput,
            assumption: format!("All {high_risks} high-severity risks demand action"),
            challenge: "When most findings are high severity, severity has stopped ranking anything"
                .to_string(),
        });
    }

    let high_improvements = optimization
        .improvements
        .iter()
        .filter(|i| i.priority >= Priority::High)
        .count();
    if high_improvements > thresholds.critic_many_high_improvements {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::AnalysisOutput,
            assumption: format!("All {high_improvements} high-priority improvements should land"),
            challenge: "Improvements compete for the same engineering time; pick the two that matter"
                .to_string(),
        });
    }

    if optimization.missing_steps.len() > thresholds.critic_many_missing_steps {
        challenged.push(ChallengedAssumption {
            id: ids.next("asm"),
            scope: AssumptionScope::AnalysisOutput,
            assumption: format!(
                "The workflow is missing {} steps",
                optimization.missing_steps.len()
            ),
            challenge: "A workflow that lacks this much was probably scoped deliberately; confirm intent before adding stages"
                .to_string(),
        });
    }

    challenged
}
