//! Risk analysis stage
//!
//! Runs the content, structural and bottleneck passes in a fixed order,
//! reweights the findings for the active goal and scores the output
//! confidence. The stage is pure: same graph and goal, same output.

mod bottleneck;
mod content;
mod structural;

use flowlens_core::{
    BottleneckKind, Confidence, Goal, IdGen, RiskKind, RiskOutput, StageGraph, WorkflowGraph,
};

use crate::config::AnalysisThresholds;

pub struct RiskAnalyzer<'a> {
    thresholds: &'a AnalysisThresholds,
}

impl<'a> RiskAnalyzer<'a> {
    pub fn new(thresholds: &'a AnalysisThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(
        &self,
        workflow: &WorkflowGraph,
        graph: &StageGraph,
        goal: Goal,
    ) -> RiskOutput {
        let mut ids = IdGen::new();

        let mut risks = content::content_risks(workflow, &mut ids);
        risks.extend(structural::spof_risks(workflow, graph, &mut ids));
        risks.extend(structural::missing_retry_risks(workflow, graph, &mut ids));
        risks.extend(structural::retry_completeness_risks(workflow, &mut ids));
        risks.extend(structural::resource_risks(workflow, self.thresholds, &mut ids));

        let mut bottlenecks = bottleneck::detect_bottlenecks(graph, self.thresholds, &mut ids);

        // Goal weighting runs once, after all passes, so escalation is
        // independent of pass order.
        match goal {
            Goal::Reliability => {
                for risk in &mut risks {
                    if matches!(
                        risk.kind,
                        RiskKind::SinglePointOfFailure | RiskKind::MissingRetry
                    ) {
                        risk.severity = risk.severity.escalate();
                    }
                }
            }
            Goal::Cost => {
                for risk in &mut risks {
                    if risk.kind == RiskKind::ScalingIssue {
                        risk.severity = risk.severity.escalate();
                    }
                }
                for b in &mut bottlenecks {
                    if b.kind == BottleneckKind::Resource {
                        b.impact = b.impact.escalate();
                    }
                }
            }
            Goal::Simplicity => {
                for b in &mut bottlenecks {
                    if b.kind == BottleneckKind::Dependency {
                        b.impact = b.impact.escalate();
                    }
                }
            }
        }

        let confidence = score_confidence(workflow, risks.len() + bottlenecks.len());
        tracing::debug!(
            %goal,
            risks = risks.len(),
            bottlenecks = bottlenecks.len(),
            confidence = confidence.get(),
            "risk analysis complete"
        );

        RiskOutput {
            risks,
            bottlenecks,
            confidence,
            narrative: None,
        }
    }
}

/// Base 0.8, small bonus per populated auxiliary section, penalized when the
/// finding volume suggests the heuristics are firing indiscriminately.
fn score_confidence(workflow: &WorkflowGraph, finding_count: usize) -> Confidence {
    let mut value = 0.8;
    if !workflow.dependencies.is_empty() {
        value += 0.05;
    }
    if !workflow.triggers.is_empty() {
        value += 0.05;
    }
    if !workflow.resources.is_empty() {
        value += 0.05;
    }
    if finding_count > 10 {
        value -= 0.1;
    }
    if finding_count > 20 {
        value -= 0.1;
    }
    Confidence::clamped(value)
}
