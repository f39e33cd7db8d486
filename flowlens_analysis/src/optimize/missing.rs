//! Missing-step derivation
//!
//! Every missing step traces back to a specific risk or bottleneck; the
//! advisor never invents steps out of thin air.

use flowlens_core::{
    BottleneckKind, IdGen, Impact, MissingStep, MissingStepKind, Priority, RiskKind, RiskOutput,
    Severity,
};

fn severity_priority(severity: Severity) -> Priority {
    match severity {
        Severity::Critical => Priority::Critical,
        Severity::High => Priority::High,
        Severity::Medium => Priority::Medium,
        Severity::Low => Priority::Low,
    }
}

fn impact_priority(impact: Impact) -> Priority {
    match impact {
        Impact::High => Priority::High,
        Impact::Medium => Priority::Medium,
        Impact::Low => Priority::Low,
    }
}

pub(super) fn derive_missing_steps(risk: &RiskOutput, ids: &mut IdGen) -> Vec<MissingStep> {
    let mut steps = Vec::new();

    for r in &risk.risks {
        let insert_after = r.affected_stages.first().cloned();
        match r.kind {
            RiskKind::MissingRetry => steps.push(MissingStep {
                id: ids.next("step"),
                kind: MissingStepKind::ErrorHandling,
                description: format!("Error handling for the gap behind '{}'", r.id),
                insert_after,
                priority: severity_priority(r.severity),
                implementation:
                    "Catch transient failures, retry with backoff and route permanent failures to a dead letter"
                        .to_string(),
            }),
            RiskKind::SinglePointOfFailure => steps.push(MissingStep {
                id: ids.next("step"),
                kind: MissingStepKind::Monitoring,
                description: format!("Health monitoring for the failure point behind '{}'", r.id),
                insert_after,
                priority: severity_priority(r.severity),
                implementation:
                    "Emit liveness and latency signals from the affected stages and alert on degradation"
                        .to_string(),
            }),
            RiskKind::ScalingIssue | RiskKind::Security | RiskKind::Data => {}
        }
    }

    for b in &risk.bottlenecks {
        let insert_after = b.affected_stages.first().cloned();
        match b.kind {
            BottleneckKind::Resource => steps.push(MissingStep {
                id: ids.next("step"),
                kind: MissingStepKind::Validation,
                description: format!("Capacity validation before the contention behind '{}'", b.id),
                insert_after,
                priority: impact_priority(b.impact),
                implementation:
                    "Check resource headroom before dispatching the contending stages".to_string(),
            }),
            BottleneckKind::Sequential => steps.push(MissingStep {
                id: ids.next("step"),
                kind: MissingStepKind::Cleanup,
                description: format!("Checkpoint cleanup along the chain behind '{}'", b.id),
                insert_after: b.affected_stages.last().cloned(),
                priority: impact_priority(b.impact),
                implementation:
                    "Persist checkpoints between chain links and prune them once the chain completes"
                        .to_string(),
            }),
            BottleneckKind::Dependency | BottleneckKind::Network => {}
        }
    }

    steps
}
