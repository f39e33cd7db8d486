//! Goal-conditioned counter-arguments
//!
//! Each rule targets a specific upstream finding by id; the critic never
//! argues against the workflow in the abstract.

use flowlens_core::{
    BottleneckKind, CounterArgument, Goal, IdGen, ImprovementKind, MissingStepKind,
    OptimizationOutput, Priority, RiskKind, RiskOutput, Severity, TargetKind,
};

pub(super) fn counter_arguments(
    goal: Goal,
    risk: &RiskOutput,
    optimization: &OptimizationOutput,
    ids: &mut IdGen,
) -> Vec<CounterArgument> {
    let mut arguments = Vec::new();

    match goal {
        Goal::Simplicity => {
            for r in risk
                .risks
                .iter()
                .filter(|r| r.kind == RiskKind::MissingRetry && r.severity <= Severity::Low)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: r.id.clone(),
                    target: TargetKind::Risk,
                    argument: "Retry machinery for a low-severity gap adds more moving parts than the gap justifies"
                        .to_string(),
                    severity: Severity::Medium,
                    tradeoffs: vec![
                        "Skipping the fix leaves a known transient-failure window".to_string(),
                    ],
                });
            }
            for imp in optimization
                .improvements
                .iter()
                .filter(|i| i.kind == ImprovementKind::Architecture)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: imp.id.clone(),
                    target: TargetKind::Improvement,
                    argument: "Restructuring trades visible dependencies for architectural indirection; the graph gets simpler, the system does not"
                        .to_string(),
                    severity: Severity::Medium,
                    tradeoffs: vec!["Keeping the current shape keeps its coupling".to_string()],
                });
            }
        }
        Goal::Cost => {
            for step in optimization
                .missing_steps
                .iter()
                .filter(|s| s.kind == MissingStepKind::Monitoring)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: step.id.clone(),
                    target: TargetKind::MissingStep,
                    argument: "Monitoring infrastructure has a recurring cost; structured logs on the existing stages may cover the same need"
                        .to_string(),
                    severity: Severity::Medium,
                    tradeoffs: vec!["Logs lack alerting; failures surface later".to_string()],
                });
            }
            for imp in optimization
                .improvements
                .iter()
                .filter(|i| i.kind == ImprovementKind::Reliability && i.priority >= Priority::High)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: imp.id.clone(),
                    target: TargetKind::Improvement,
                    argument: "Redundancy roughly doubles the affected stage's spend; price the failure it prevents first"
                        .to_string(),
                    severity: Severity::Medium,
                    tradeoffs: vec!["Without redundancy the failure mode stays".to_string()],
                });
            }
        }
        Goal::Reliability => {
            for imp in optimization
                .improvements
                .iter()
                .filter(|i| i.kind == ImprovementKind::Cost)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: imp.id.clone(),
                    target: TargetKind::Improvement,
                    argument: "Merging or right-sizing reduces isolation; one stage's failure now takes its merged neighbors with it"
                        .to_string(),
                    severity: Severity::Medium,
                    tradeoffs: vec!["Keeping stages separate keeps their overhead".to_string()],
                });
            }
            for b in risk
                .bottlenecks
                .iter()
                .filter(|b| b.kind == BottleneckKind::Sequential)
            {
                arguments.push(CounterArgument {
                    id: ids.next("ca"),
                    target_id: b.id.clone(),
                    target: TargetKind::Bottleneck,
                    argument: "A strict sequence may be the safest ordering; parallelizing it introduces interleavings nobody has tested"
                        .to_string(),
                    severity: Severity::Low,
                    tradeoffs: vec!["Keeping the chain keeps its latency".to_string()],
                });
            }
        }
    }

    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlens_core::{Confidence, Improvement, MissingStep, Risk, WorkflowGraph};

    fn empty_optimization() -> OptimizationOutput {
        OptimizationOutput {
            improvements: Vec::new(),
            missing_steps: Vec::new(),
            refined_graph: WorkflowGraph {
                stages: vec![crate::test_util::stage("a")],
                dependencies: Vec::new(),
                triggers: Vec::new(),
                resources: Vec::new(),
                metadata: Default::default(),
            },
            confidence: Confidence::clamped(0.8),
            narrative: None,
        }
    }

    fn empty_risk() -> RiskOutput {
        RiskOutput {
            risks: Vec::new(),
            bottlenecks: Vec::new(),
            confidence: Confidence::clamped(0.8),
            narrative: None,
        }
    }

    #[test]
    fn test_simplicity_challenges_low_severity_retry_risks() {
        let mut risk = empty_risk();
        risk.risks.push(Risk {
            id: "risk-1".to_string(),
            kind: RiskKind::MissingRetry,
            severity: Severity::Low,
            description: String::new(),
            affected_stages: Vec::new(),
            mitigation: String::new(),
        });
        let args =
            counter_arguments(Goal::Simplicity, &risk, &empty_optimization(), &mut IdGen::new());

        assert_eq!(args.len(), 1);
        assert_eq!(args[0].target_id, "risk-1");
        assert_eq!(args[0].target, TargetKind::Risk);
    }

    #[test]
    fn test_high_severity_retry_risk_not_challenged_under_simplicity() {
        let mut risk = empty_risk();
        risk.risks.push(Risk {
            id: "risk-1".to_string(),
            kind: RiskKind::MissingRetry,
            severity: Severity::High,
            description: String::new(),
            affected_stages: Vec::new(),
            mitigation: String::new(),
        });
        let args =
            counter_arguments(Goal::Simplicity, &risk, &empty_optimization(), &mut IdGen::new());
        assert!(args.is_empty());
    }

    #[test]
    fn test_cost_challenges_monitoring_steps() {
        let mut opt = empty_optimization();
        opt.missing_steps.push(MissingStep {
            id: "step-1".to_string(),
            kind: MissingStepKind::Monitoring,
            description: String::new(),
            insert_after: None,
            priority: Priority::High,
            implementation: String::new(),
        });
        let args = counter_arguments(Goal::Cost, &empty_risk(), &opt, &mut IdGen::new());

        assert_eq!(args.len(), 1);
        assert_eq!(args[0].target, TargetKind::MissingStep);
        assert!(args[0].argument.contains("recurring cost"));
    }

    #[test]
    fn test_reliability_challenges_cost_improvements() {
        let mut opt = empty_optimization();
        opt.improvements.push(Improvement {
            id: "imp-1".to_string(),
            kind: ImprovementKind::Cost,
            priority: Priority::Low,
            description: String::new(),
            implementation: String::new(),
            tradeoffs: Vec::new(),
            goal_alignment: 0.4,
        });
        let args = counter_arguments(Goal::Reliability, &empty_risk(), &opt, &mut IdGen::new());
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].target_id, "imp-1");
    }
}
