//! Structural risk passes: single points of failure, missing retries on
//! critical stages, retry-policy completeness and shared-resource exposure.

use flowlens_core::{
    DependencyKind, IdGen, Risk, RiskKind, Severity, StageGraph, StageKind, WorkflowGraph,
};
use indexmap::IndexMap;

use crate::config::AnalysisThresholds;

/// A stage is critical when the graph narrows through it: more than one
/// dependent, a join that still feeds downstream work, or a branching
/// condition.
fn is_critical(graph: &StageGraph, id: &str, kind: StageKind) -> bool {
    let out = graph.outgoing_count(id);
    let inc = graph.incoming_count(id);
    out > 1 || (inc > 1 && out >= 1) || kind == StageKind::Condition
}

fn spof_severity(dependents: usize) -> Severity {
    if dependents >= 5 {
        Severity::Critical
    } else if dependents >= 3 {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Stages whose failure strands more than one dependent with no conditional
/// fallback path.
pub(super) fn spof_risks(
    workflow: &WorkflowGraph,
    graph: &StageGraph,
    ids: &mut IdGen,
) -> Vec<Risk> {
    let mut risks = Vec::new();

    for stage in &workflow.stages {
        let outgoing = graph.outgoing(&stage.id);
        let has_fallback = outgoing
            .iter()
            .any(|(_, kind)| *kind == DependencyKind::Conditional);
        if outgoing.len() <= 1 || has_fallback {
            continue;
        }

        let mut dependents: Vec<String> =
            outgoing.iter().map(|(to, _)| to.to_string()).collect();
        dependents.sort();

        let mut affected = vec![stage.id.clone()];
        affected.extend(dependents.iter().cloned());

        risks.push(Risk {
            id: ids.next("risk"),
            kind: RiskKind::SinglePointOfFailure,
            severity: spof_severity(dependents.len()),
            description: format!(
                "Stage '{}' blocks {} downstream stages with no alternative path",
                stage.name,
                dependents.len()
            ),
            affected_stages: affected,
            mitigation: "Add a conditional fallback path or redundant execution for this stage"
                .to_string(),
        });
    }

    risks
}

/// Critical stages that declare no retry policy at all.
pub(super) fn missing_retry_risks(
    workflow: &WorkflowGraph,
    graph: &StageGraph,
    ids: &mut IdGen,
) -> Vec<Risk> {
    let mut risks = Vec::new();

    for stage in &workflow.stages {
        if stage.retry_policy.is_some() || !is_critical(graph, &stage.id, stage.kind) {
            continue;
        }
        risks.push(Risk {
            id: ids.next("risk"),
            kind: RiskKind::MissingRetry,
            severity: Severity::High,
            description: format!(
                "Critical stage '{}' has no retry policy; a transient failure stops the workflow",
                stage.name
            ),
            affected_stages: vec![stage.id.clone()],
            mitigation: "Declare a retry policy with at least two attempts and exponential backoff"
                .to_string(),
        });
    }

    risks
}

/// Declared retry policies that cannot actually absorb a failure.
pub(super) fn retry_completeness_risks(workflow: &WorkflowGraph, ids: &mut IdGen) -> Vec<Risk> {
    let mut risks = Vec::new();

    for stage in &workflow.stages {
        let Some(policy) = &stage.retry_policy else {
            continue;
        };

        if policy.max_attempts < 2 {
            risks.push(Risk {
                id: ids.next("risk"),
                kind: RiskKind::MissingRetry,
                severity: Severity::Low,
                description: format!(
                    "Stage '{}' declares a retry policy that allows only {} attempt(s)",
                    stage.name, policy.max_attempts
                ),
                affected_stages: vec![stage.id.clone()],
                mitigation: "Raise max_attempts to at least 2 so the policy can absorb a failure"
                    .to_string(),
            });
        }

        if policy.retry_on.is_empty() {
            risks.push(Risk {
                id: ids.next("risk"),
                kind: RiskKind::MissingRetry,
                severity: Severity::Low,
                description: format!(
                    "Stage '{}' declares a retry policy with no retryable error classes",
                    stage.name
                ),
                affected_stages: vec![stage.id.clone()],
                mitigation: "List the error classes the policy should retry on".to_string(),
            });
        }
    }

    risks
}

/// Resources shared by enough stages to become a failure domain of their own.
pub(super) fn resource_risks(
    workflow: &WorkflowGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<Risk> {
    let mut users: IndexMap<&str, Vec<String>> = IndexMap::new();
    for stage in &workflow.stages {
        for resource in &stage.resources {
            users.entry(resource.as_str()).or_default().push(stage.id.clone());
        }
    }

    let mut risks = Vec::new();
    for (resource, stages) in users {
        if stages.len() <= thresholds.resource_spof_users {
            continue;
        }
        let severity = if stages.len() > thresholds.resource_group_high_impact {
            Severity::High
        } else {
            Severity::Medium
        };
        risks.push(Risk {
            id: ids.next("risk"),
            kind: RiskKind::SinglePointOfFailure,
            severity,
            description: format!(
                "Resource '{}' is shared by {} stages; its outage stops all of them",
                resource,
                stages.len()
            ),
            affected_stages: stages,
            mitigation: format!(
                "Add capacity or a replica for '{resource}', or partition its consumers"
            ),
        });
    }

    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{dep, dep_kind, fan_out_workflow, stage, workflow};
    use flowlens_core::RetryPolicy;

    #[test]
    fn test_fan_out_without_fallback_is_spof() {
        let wf = fan_out_workflow(5);
        let graph = StageGraph::from_workflow(&wf);
        let risks = spof_risks(&wf, &graph, &mut IdGen::new());

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].severity, Severity::Critical);
        assert_eq!(risks[0].affected_stages[0], "hub");
        assert_eq!(risks[0].affected_stages.len(), 6);
    }

    #[test]
    fn test_conditional_edge_counts_as_fallback() {
        let wf = workflow(
            vec![stage("a"), stage("b"), stage("c")],
            vec![
                dep("a", "b"),
                dep_kind("a", "c", flowlens_core::DependencyKind::Conditional),
            ],
        );
        let graph = StageGraph::from_workflow(&wf);
        assert!(spof_risks(&wf, &graph, &mut IdGen::new()).is_empty());
    }

    #[test]
    fn test_spof_severity_scales_with_dependents() {
        let wf = fan_out_workflow(3);
        let graph = StageGraph::from_workflow(&wf);
        let risks = spof_risks(&wf, &graph, &mut IdGen::new());
        assert_eq!(risks[0].severity, Severity::High);

        let wf = fan_out_workflow(2);
        let graph = StageGraph::from_workflow(&wf);
        let risks = spof_risks(&wf, &graph, &mut IdGen::new());
        assert_eq!(risks[0].severity, Severity::Medium);
    }

    #[test]
    fn test_critical_stage_without_retry_flagged() {
        let wf = fan_out_workflow(2);
        let graph = StageGraph::from_workflow(&wf);
        let risks = missing_retry_risks(&wf, &graph, &mut IdGen::new());

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].kind, RiskKind::MissingRetry);
        assert_eq!(risks[0].affected_stages, vec!["hub"]);
    }

    #[test]
    fn test_critical_stage_with_retry_not_flagged() {
        let mut wf = fan_out_workflow(2);
        wf.stages[0].retry_policy = Some(RetryPolicy {
            max_attempts: 3,
            backoff: Default::default(),
            retry_on: vec!["timeout".to_string()],
        });
        let graph = StageGraph::from_workflow(&wf);
        assert!(missing_retry_risks(&wf, &graph, &mut IdGen::new()).is_empty());
    }

    #[test]
    fn test_noncritical_stage_without_retry_not_flagged() {
        let wf = workflow(vec![stage("a"), stage("b")], vec![dep("a", "b")]);
        let graph = StageGraph::from_workflow(&wf);
        assert!(missing_retry_risks(&wf, &graph, &mut IdGen::new()).is_empty());
    }

    #[test]
    fn test_ineffective_retry_policies_flagged_low() {
        let mut wf = workflow(vec![stage("a")], Vec::new());
        wf.stages[0].retry_policy = Some(RetryPolicy {
            max_attempts: 1,
            backoff: Default::default(),
            retry_on: Vec::new(),
        });
        let risks = retry_completeness_risks(&wf, &mut IdGen::new());

        assert_eq!(risks.len(), 2);
        assert!(risks.iter().all(|r| r.severity == Severity::Low));
    }

    #[test]
    fn test_shared_resource_flagged_above_threshold() {
        let mut wf = workflow(vec![stage("a"), stage("b"), stage("c")], Vec::new());
        for s in &mut wf.stages {
            s.resources.push("db".to_string());
        }
        let risks = resource_risks(&wf, &AnalysisThresholds::default(), &mut IdGen::new());

        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].severity, Severity::Medium);
        assert_eq!(risks[0].affected_stages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_two_resource_users_below_threshold() {
        let mut wf = workflow(vec![stage("a"), stage("b")], Vec::new());
        for s in &mut wf.stages {
            s.resources.push("db".to_string());
        }
        assert!(resource_risks(&wf, &AnalysisThresholds::default(), &mut IdGen::new()).is_empty());
    }
}
