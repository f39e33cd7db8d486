//! Content-pattern improvement templates
//!
//! Each (pattern family, goal) pair maps to a fixed template. The pairing is
//! the point: the same CI/CD workflow gets a caching suggestion under COST
//! and a rollback suggestion under RELIABILITY.

use flowlens_core::{
    Goal, IdGen, Improvement, ImprovementKind, Priority, Stage, WorkflowGraph,
};

use crate::keywords::{matching_stages, IMPROVEMENT_PATTERNS};

use super::alignment::goal_alignment;

struct Template {
    kind: ImprovementKind,
    priority: Priority,
    description: &'static str,
    implementation: &'static str,
    tradeoffs: &'static [&'static str],
}

fn template(pattern: &str, goal: Goal) -> Option<Template> {
    let t = match (pattern, goal) {
        ("ci-cd", Goal::Reliability) => Template {
            kind: ImprovementKind::Reliability,
            priority: Priority::High,
            description: "Gate the build pipeline behind automated smoke tests with rollback",
            implementation: "Add a smoke-test stage after deployment and wire an automatic rollback on failure",
            tradeoffs: &["Longer pipeline wall time", "Rollback automation needs its own testing"],
        },
        ("ci-cd", Goal::Cost) => Template {
            kind: ImprovementKind::Cost,
            priority: Priority::Medium,
            description: "Cache build artifacts and dependencies between pipeline runs",
            implementation: "Introduce a content-addressed artifact cache keyed by lockfile hashes",
            tradeoffs: &["Cache invalidation bugs can mask stale builds"],
        },
        ("ci-cd", Goal::Simplicity) => Template {
            kind: ImprovementKind::Maintainability,
            priority: Priority::Medium,
            description: "Consolidate build and integration stages into one declarative pipeline definition",
            implementation: "Move per-stage shell fragments into a single versioned pipeline file",
            tradeoffs: &["One large definition is harder to review in isolation"],
        },
        ("data-processing", Goal::Reliability) => Template {
            kind: ImprovementKind::Reliability,
            priority: Priority::High,
            description: "Checkpoint data processing stages so a restart resumes instead of recomputing",
            implementation: "Persist intermediate outputs with an idempotency marker per batch",
            tradeoffs: &["Checkpoint storage costs", "Restart logic adds code paths"],
        },
        ("data-processing", Goal::Cost) => Template {
            kind: ImprovementKind::Cost,
            priority: Priority::Medium,
            description: "Batch data processing into off-peak windows",
            implementation: "Schedule heavy transforms where compute is cheapest and batch small inputs together",
            tradeoffs: &["Higher end-to-end latency for individual records"],
        },
        ("data-processing", Goal::Simplicity) => Template {
            kind: ImprovementKind::Maintainability,
            priority: Priority::Medium,
            description: "Standardize data stages on one transform interface",
            implementation: "Define a single input/output contract all transform stages implement",
            tradeoffs: &["Migration effort for existing stages"],
        },
        ("approval", Goal::Reliability) => Template {
            kind: ImprovementKind::Reliability,
            priority: Priority::High,
            description: "Add escalation timeouts to manual approval stages",
            implementation: "Notify a delegate approver when an approval waits longer than its SLA",
            tradeoffs: &["Delegates need the same context as primary approvers"],
        },
        ("approval", Goal::Cost) => Template {
            kind: ImprovementKind::Cost,
            priority: Priority::Medium,
            description: "Auto-approve low-risk changes to cut idle waiting time",
            implementation: "Define a risk rubric and approve matching requests without human review",
            tradeoffs: &["A mis-calibrated rubric lets bad changes through"],
        },
        ("approval", Goal::Simplicity) => Template {
            kind: ImprovementKind::Architecture,
            priority: Priority::Medium,
            description: "Collapse stacked approval stages into a single review gate",
            implementation: "Merge sequential approval stages into one gate with a combined checklist",
            tradeoffs: &["Coarser audit trail per approval"],
        },
        ("notification", Goal::Reliability) => Template {
            kind: ImprovementKind::Reliability,
            priority: Priority::Medium,
            description: "Deliver notifications through a retried outbox rather than fire-and-forget",
            implementation: "Write notifications to an outbox table drained by a retrying sender",
            tradeoffs: &["Delivery becomes eventually consistent"],
        },
        ("notification", Goal::Cost) => Template {
            kind: ImprovementKind::Cost,
            priority: Priority::Low,
            description: "Digest repeated notifications instead of sending each one",
            implementation: "Coalesce notifications per recipient over a short window",
            tradeoffs: &["Urgent events wait for the digest window"],
        },
        ("notification", Goal::Simplicity) => Template {
            kind: ImprovementKind::Maintainability,
            priority: Priority::Low,
            description: "Route all notifications through one channel abstraction",
            implementation: "Replace per-stage email/chat calls with a single notification interface",
            tradeoffs: &["Channel-specific features need escape hatches"],
        },
        ("security", Goal::Reliability) => Template {
            kind: ImprovementKind::Reliability,
            priority: Priority::High,
            description: "Fail closed when security checks cannot complete",
            implementation: "Treat scanner timeouts as failures and block promotion until they pass",
            tradeoffs: &["Scanner flakiness now blocks delivery"],
        },
        ("security", Goal::Cost) => Template {
            kind: ImprovementKind::Performance,
            priority: Priority::Medium,
            description: "Scan only changed artifacts instead of the full tree",
            implementation: "Key security scans on content hashes and skip unchanged inputs",
            tradeoffs: &["Hash bookkeeping adds pipeline state"],
        },
        ("security", Goal::Simplicity) => Template {
            kind: ImprovementKind::Maintainability,
            priority: Priority::Medium,
            description: "Centralize credential handling in one secrets stage",
            implementation: "Fetch all secrets in a dedicated stage and pass handles, not values",
            tradeoffs: &["The secrets stage becomes a shared dependency"],
        },
        _ => return None,
    };
    Some(t)
}

/// One improvement per matching pattern family, in table order.
pub(super) fn pattern_improvements(
    workflow: &WorkflowGraph,
    goal: Goal,
    ids: &mut IdGen,
) -> Vec<Improvement> {
    let mut improvements = Vec::new();

    for pattern in IMPROVEMENT_PATTERNS {
        let matched: Vec<&Stage> = matching_stages(&workflow.stages, pattern.keywords);
        if matched.is_empty() {
            continue;
        }
        let Some(t) = template(pattern.name, goal) else {
            continue;
        };
        improvements.push(Improvement {
            id: ids.next("imp"),
            kind: t.kind,
            priority: t.priority,
            description: t.description.to_string(),
            implementation: t.implementation.to_string(),
            tradeoffs: t.tradeoffs.iter().map(|s| s.to_string()).collect(),
            goal_alignment: goal_alignment(goal, t.kind),
        });
    }

    improvements
}
