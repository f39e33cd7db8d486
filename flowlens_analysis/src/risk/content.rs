//! Content-pattern risk pass
//!
//! Matches stage text against the keyword families in [`crate::keywords`].
//! Each family contributes at most one risk, aggregating every matching
//! stage, so a workflow with five deployment stages still reads as one
//! deployment risk with five affected stages.

use flowlens_core::{IdGen, Risk, WorkflowGraph};

use crate::keywords::{matching_stages, RISK_FAMILIES};

pub(super) fn content_risks(workflow: &WorkflowGraph, ids: &mut IdGen) -> Vec<Risk> {
    let mut risks = Vec::new();

    for family in RISK_FAMILIES {
        let matched = matching_stages(&workflow.stages, family.keywords);
        if matched.is_empty() {
            continue;
        }
        risks.push(Risk {
            id: ids.next("risk"),
            kind: family.kind,
            severity: family.severity,
            description: family.description.to_string(),
            affected_stages: matched.iter().map(|s| s.id.clone()).collect(),
            mitigation: family.mitigation.to_string(),
        });
    }

    risks
}
