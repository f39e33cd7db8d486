//! Declarative keyword-family rule tables
//!
//! Content heuristics match stage names and descriptions against fixed
//! keyword families. Keeping the families as data (rather than inline string
//! checks) means a new pattern is a new table row, not new control flow.

use flowlens_core::{RiskKind, Severity, Stage};

/// A content-risk keyword family.
///
/// Each family yields at most one risk per analysis, aggregating every
/// matching stage.
pub struct RiskKeywordFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub kind: RiskKind,
    pub severity: Severity,
    pub description: &'static str,
    pub mitigation: &'static str,
}

/// Content-risk families, checked in order
pub const RISK_FAMILIES: &[RiskKeywordFamily] = &[
    RiskKeywordFamily {
        name: "deployment",
        keywords: &["deploy", "release", "rollout", "publish", "ship"],
        kind: RiskKind::ScalingIssue,
        severity: Severity::Medium,
        description: "Deployment stages can leave the system in a mixed-version state if they fail midway",
        mitigation: "Adopt a staged rollout with an automated rollback path",
    },
    RiskKeywordFamily {
        name: "data-processing",
        keywords: &["data", "transform", "etl", "migrat", "ingest"],
        kind: RiskKind::Data,
        severity: Severity::High,
        description: "Data processing stages risk loss or corruption when interrupted",
        mitigation: "Validate inputs, checkpoint intermediate results and keep source data until completion",
    },
    RiskKeywordFamily {
        name: "external-dependency",
        keywords: &["api", "external", "third-party", "webhook", "upstream", "fetch"],
        kind: RiskKind::MissingRetry,
        severity: Severity::Medium,
        description: "Stages calling external services inherit their availability",
        mitigation: "Wrap external calls with retries, timeouts and a circuit breaker",
    },
    RiskKeywordFamily {
        name: "approval",
        keywords: &["approv", "review", "sign-off", "signoff", "manual"],
        kind: RiskKind::SinglePointOfFailure,
        severity: Severity::Medium,
        description: "Manual approval stages stall the workflow when the approver is unavailable",
        mitigation: "Add escalation timeouts and a delegate approver list",
    },
];

/// An improvement-pattern keyword family; the (family, goal) pair selects a
/// fixed improvement template in the optimization advisor.
pub struct ImprovementPattern {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

pub const IMPROVEMENT_PATTERNS: &[ImprovementPattern] = &[
    ImprovementPattern {
        name: "ci-cd",
        keywords: &["build", "compile", "ci", "cd", "integration", "pipeline"],
    },
    ImprovementPattern {
        name: "data-processing",
        keywords: &["data", "transform", "etl", "ingest"],
    },
    ImprovementPattern {
        name: "approval",
        keywords: &["approv", "review", "sign-off", "signoff", "manual"],
    },
    ImprovementPattern {
        name: "notification",
        keywords: &["notif", "alert", "email", "slack", "message"],
    },
    ImprovementPattern {
        name: "security",
        keywords: &["auth", "security", "secret", "credential", "encrypt", "scan"],
    },
];

/// Words in an improvement's own text that suggest it is heavier than the
/// problem it solves (used by the critic).
pub const COMPLEXITY_KEYWORDS: &[&str] = &["complex", "sophisticated", "advanced", "enterprise"];

/// Stages matching a keyword family, in declaration order
pub fn matching_stages<'a>(stages: &'a [Stage], keywords: &[&str]) -> Vec<&'a Stage> {
    stages
        .iter()
        .filter(|stage| {
            let text = stage.searchable_text();
            keywords.iter().any(|kw| text.contains(kw))
        })
        .collect()
}
