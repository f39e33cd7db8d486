//! Refined graph construction
//!
//! The input graph is never mutated; refinement deep-copies it and appends a
//! synthesized stage per high-priority missing step, marked so downstream
//! consumers can tell added stages from authored ones.

use std::collections::BTreeMap;

use chrono::Utc;
use flowlens_core::{MissingStep, MissingStepKind, Priority, Stage, StageKind, WorkflowGraph};

fn stage_kind_for(kind: MissingStepKind) -> StageKind {
    match kind {
        MissingStepKind::Validation => StageKind::Condition,
        MissingStepKind::Monitoring | MissingStepKind::Notification => StageKind::Parallel,
        MissingStepKind::ErrorHandling | MissingStepKind::Cleanup => StageKind::Task,
    }
}

fn step_name(kind: MissingStepKind) -> &'static str {
    match kind {
        MissingStepKind::Validation => "Validation",
        MissingStepKind::ErrorHandling => "Error handling",
        MissingStepKind::Monitoring => "Monitoring",
        MissingStepKind::Cleanup => "Cleanup",
        MissingStepKind::Notification => "Notification",
    }
}

pub(super) fn build_refined_graph(
    original: &WorkflowGraph,
    missing_steps: &[MissingStep],
) -> WorkflowGraph {
    let mut refined = original.clone();

    let high_priority: Vec<&MissingStep> = missing_steps
        .iter()
        .filter(|step| step.priority >= Priority::High)
        .collect();
    if high_priority.is_empty() {
        return refined;
    }

    for step in &high_priority {
        let mut config: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        config.insert("synthesized".to_string(), serde_json::Value::Bool(true));
        config.insert(
            "source_finding".to_string(),
            serde_json::Value::String(step.id.clone()),
        );

        refined.stages.push(Stage {
            id: format!("added-{}", step.id),
            name: step_name(step.kind).to_string(),
            description: step.description.clone(),
            kind: stage_kind_for(step.kind),
            config,
            depends_on: step.insert_after.iter().cloned().collect(),
            resources: Vec::new(),
            retry_policy: None,
        });
    }

    if refined.metadata.name.is_empty() {
        refined.metadata.name = "refined workflow".to_string();
    } else {
        refined.metadata.name.push_str(" (refined)");
    }
    refined.metadata.description.push_str(&format!(
        " [refined: {} stage(s) added]",
        high_priority.len()
    ));
    refined.metadata.modified_at = Some(Utc::now());

    refined
}
