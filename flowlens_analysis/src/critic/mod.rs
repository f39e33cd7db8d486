//! Critic stage
//!
//! Consumes the risk and optimization outputs read-only and produces
//! counter-arguments, challenged assumptions, overengineering detections and
//! alternative perspectives. The critic's confidence drops when the upstream
//! stages were themselves unsure.

mod assumptions;
mod counters;
mod overengineering;
mod perspectives;

pub use overengineering::similarity;

use flowlens_core::{
    Confidence, CriticismOutput, Goal, IdGen, OptimizationOutput, RiskOutput, WorkflowGraph,
};

use crate::config::AnalysisThresholds;

/// Upstream confidence below this weakens the critique built on top of it.
const SHAKY_UPSTREAM: f64 = 0.6;

pub struct Critic<'a> {
    thresholds: &'a AnalysisThresholds,
}

impl<'a> Critic<'a> {
    pub fn new(thresholds: &'a AnalysisThresholds) -> Self {
        Self { thresholds }
    }

    pub fn criticize(
        &self,
        workflow: &WorkflowGraph,
        goal: Goal,
        risk: &RiskOutput,
        optimization: &OptimizationOutput,
    ) -> CriticismOutput {
        let mut ids = IdGen::new();
        let summary = workflow.summary();

        let counter_arguments = counters::counter_arguments(goal, risk, optimization, &mut ids);

        let mut challenged_assumptions =
            assumptions::challenge_input(&summary, self.thresholds, &mut ids);
        challenged_assumptions.extend(assumptions::challenge_output(
            risk,
            optimization,
            self.thresholds,
            &mut ids,
        ));

        let overengineering =
            overengineering::detect(workflow, goal, optimization, self.thresholds, &mut ids);
        let alternatives =
            perspectives::alternatives(&summary, optimization, self.thresholds, &mut ids);

        let finding_count = counter_arguments.len()
            + challenged_assumptions.len()
            + overengineering.len()
            + alternatives.len();
        let confidence = score_confidence(risk, optimization, finding_count);
        tracing::debug!(
            %goal,
            counter_arguments = counter_arguments.len(),
            assumptions = challenged_assumptions.len(),
            overengineering = overengineering.len(),
            confidence = confidence.get(),
            "criticism complete"
        );

        CriticismOutput {
            counter_arguments,
            challenged_assumptions,
            overengineering,
            alternatives,
            confidence,
            narrative: None,
        }
    }
}

fn score_confidence(
    risk: &RiskOutput,
    optimization: &OptimizationOutput,
    finding_count: usize,
) -> Confidence {
    let mut value = 0.7;
    if risk.finding_count() > 0 {
        value += 0.05;
    }
    if optimization.suggestion_count() > 0 {
        value += 0.05;
    }
    if finding_count > 0 {
        value += 0.05;
    }
    if risk.confidence.get() < SHAKY_UPSTREAM {
        value -= 0.1;
    }
    if optimization.confidence.get() < SHAKY_UPSTREAM {
        value -= 0.1;
    }
    Confidence::clamped(value)
}
