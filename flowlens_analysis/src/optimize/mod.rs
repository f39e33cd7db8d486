//! Optimization advisory stage
//!
//! Improvements come from four generator groups run in a fixed order:
//! content patterns, complexity metrics, relationship shape and the active
//! goal. Missing steps are derived from the risk stage's findings, and
//! high-priority ones are materialized into the refined graph.

mod alignment;
mod missing;
mod patterns;
mod refine;

pub use alignment::goal_alignment;

use flowlens_core::{
    BottleneckKind, Confidence, Goal, IdGen, Improvement, ImprovementKind, OptimizationOutput,
    Priority, RiskKind, RiskOutput, StageGraph, TriggerKind, WorkflowGraph,
};

use crate::config::AnalysisThresholds;

pub struct OptimizationAdvisor<'a> {
    thresholds: &'a AnalysisThresholds,
}

impl<'a> OptimizationAdvisor<'a> {
    pub fn new(thresholds: &'a AnalysisThresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(
        &self,
        workflow: &WorkflowGraph,
        graph: &StageGraph,
        goal: Goal,
        risk: &RiskOutput,
    ) -> OptimizationOutput {
        let mut ids = IdGen::new();
        let summary = workflow.summary();

        let mut improvements = patterns::pattern_improvements(workflow, goal, &mut ids);
        improvements.extend(self.complexity_improvements(&summary, goal, &mut ids));
        improvements.extend(self.relationship_improvements(&summary, goal, &mut ids));
        improvements.extend(self.goal_improvements(workflow, graph, goal, risk, &mut ids));

        if improvements.is_empty() {
            improvements.push(fallback_improvement(goal, &mut ids));
        }

        let missing_steps = missing::derive_missing_steps(risk, &mut ids);
        let refined_graph = refine::build_refined_graph(workflow, &missing_steps);

        let confidence = score_confidence(risk, improvements.len() + missing_steps.len());
        tracing::debug!(
            %goal,
            improvements = improvements.len(),
            missing_steps = missing_steps.len(),
            confidence = confidence.get(),
            "optimization analysis complete"
        );

        OptimizationOutput {
            improvements,
            missing_steps,
            refined_graph,
            confidence,
            narrative: None,
        }
    }

    fn complexity_improvements(
        &self,
        summary: &flowlens_core::GraphSummary,
        goal: Goal,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        let mut improvements = Vec::new();

        if summary.stage_count > self.thresholds.split_stage_count {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Maintainability,
                Priority::High,
                format!(
                    "Split the workflow into sub-workflows; {} stages exceed what one graph can express clearly",
                    summary.stage_count
                ),
                "Group stages by concern and extract each group into a child workflow with one entry and one exit"
                    .to_string(),
                vec!["Cross-workflow failures become harder to trace".to_string()],
            ));
        }

        if summary.dependency_ratio > self.thresholds.decouple_dependency_ratio {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Architecture,
                Priority::Medium,
                format!(
                    "Reduce coupling; {:.1} dependencies per stage means most edits ripple",
                    summary.dependency_ratio
                ),
                "Replace point-to-point dependencies with shared artifacts or events where the order is incidental"
                    .to_string(),
                vec!["Implicit ordering through artifacts is easier to get wrong".to_string()],
            ));
        }

        improvements
    }

    fn relationship_improvements(
        &self,
        summary: &flowlens_core::GraphSummary,
        goal: Goal,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        let mut improvements = Vec::new();

        if summary.independent_stages.len() > self.thresholds.orchestration_independent {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Architecture,
                Priority::Medium,
                format!(
                    "{} stages have no dependencies at all; the workflow is a bag of tasks, not a graph",
                    summary.independent_stages.len()
                ),
                "Introduce an orchestration layer or explicit ordering for the independent stages"
                    .to_string(),
                vec!["Added ordering serializes work that runs concurrently today".to_string()],
            ));
        }

        if summary.terminal_stages.len() > self.thresholds.reporting_terminal {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Maintainability,
                Priority::Low,
                format!(
                    "{} terminal stages mean there is no single place to observe completion",
                    summary.terminal_stages.len()
                ),
                "Add a consolidated reporting stage that all terminal stages feed into".to_string(),
                vec!["The reporting stage gates overall completion".to_string()],
            ));
        }

        improvements
    }

    fn goal_improvements(
        &self,
        workflow: &WorkflowGraph,
        graph: &StageGraph,
        goal: Goal,
        risk: &RiskOutput,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        match goal {
            Goal::Reliability => self.reliability_improvements(workflow, graph, risk, ids),
            Goal::Cost => self.cost_improvements(workflow, graph, risk, ids),
            Goal::Simplicity => self.simplicity_improvements(workflow, ids),
        }
    }

    fn reliability_improvements(
        &self,
        workflow: &WorkflowGraph,
        graph: &StageGraph,
        risk: &RiskOutput,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        let goal = Goal::Reliability;
        let mut improvements = Vec::new();

        for r in risk
            .risks
            .iter()
            .filter(|r| r.kind == RiskKind::SinglePointOfFailure)
        {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Reliability,
                Priority::High,
                format!("Add redundancy for the single point of failure behind '{}'", r.id),
                "Run a standby replica of the affected stage or provide a conditional fallback path"
                    .to_string(),
                vec!["Redundant execution doubles the stage's resource use".to_string()],
            ));
        }

        if risk.risks.iter().any(|r| r.kind == RiskKind::MissingRetry) {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Reliability,
                Priority::Medium,
                "Standardize retry policies across stages that lack or misdeclare them".to_string(),
                "Define one default retry policy and apply it to every stage without an explicit one"
                    .to_string(),
                vec!["Blanket retries can hammer an already failing dependency".to_string()],
            ));
        }

        let fan_out_heavy: Vec<&str> = graph
            .stage_ids()
            .into_iter()
            .filter(|id| graph.outgoing_count(id) > self.thresholds.high_fan_out)
            .collect();
        if !fan_out_heavy.is_empty() {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Reliability,
                Priority::Medium,
                format!(
                    "Monitor the {} high fan-out stage(s) whose failure cascades widest",
                    fan_out_heavy.len()
                ),
                "Alert on error rate and latency for these stages before their dependents notice"
                    .to_string(),
                vec!["More alerts to tune and triage".to_string()],
            ));
        }

        improvements
    }

    fn cost_improvements(
        &self,
        workflow: &WorkflowGraph,
        graph: &StageGraph,
        risk: &RiskOutput,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        let goal = Goal::Cost;
        let mut improvements = Vec::new();

        let unsized_resources = workflow
            .resources
            .iter()
            .filter(|r| r.capacity.is_none())
            .count();
        if unsized_resources > 0 {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Cost,
                Priority::Medium,
                format!(
                    "{} resource(s) declare no capacity; unsized resources default to over-provisioning",
                    unsized_resources
                ),
                "Measure peak usage per resource and declare an explicit capacity".to_string(),
                vec!["An undersized declaration turns into throttling".to_string()],
            ));
        }

        if risk
            .bottlenecks
            .iter()
            .any(|b| b.kind == BottleneckKind::Resource)
        {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Cost,
                Priority::Medium,
                "Scale the contended resources instead of letting stages queue on them".to_string(),
                "Size the contended resources for the concurrent demand the graph actually creates"
                    .to_string(),
                vec!["Capacity for peak demand sits idle off-peak".to_string()],
            ));
        }

        let mergeable = graph
            .sequential_chains()
            .into_iter()
            .filter(|chain| chain.len() < self.thresholds.chain_bottleneck_len)
            .count();
        if mergeable > 0 {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Cost,
                Priority::Low,
                format!(
                    "{} short chain(s) pay per-stage overhead that merging would eliminate",
                    mergeable
                ),
                "Merge adjacent short stages that always run together into one stage".to_string(),
                vec!["Coarser stages give coarser progress reporting".to_string()],
            ));
        }

        let schedules = workflow
            .triggers
            .iter()
            .filter(|t| t.kind == TriggerKind::Schedule)
            .count();
        if schedules > 1 {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Cost,
                Priority::Low,
                format!("{schedules} schedule triggers each spin the workflow up separately"),
                "Consolidate overlapping schedules into one trigger that batches the work"
                    .to_string(),
                vec!["Batched runs delay the earliest-scheduled work".to_string()],
            ));
        }

        improvements
    }

    fn simplicity_improvements(
        &self,
        workflow: &WorkflowGraph,
        ids: &mut IdGen,
    ) -> Vec<Improvement> {
        let goal = Goal::Simplicity;
        let summary = workflow.summary();
        let mut improvements = Vec::new();

        if summary.stage_count > self.thresholds.split_stage_count {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Maintainability,
                Priority::High,
                format!(
                    "Reduce the stage count; {} stages is more workflow than the process needs",
                    summary.stage_count
                ),
                "Fold stages that exist only to sequence other stages into their neighbors"
                    .to_string(),
                vec!["Fewer stages means fewer natural retry boundaries".to_string()],
            ));
        }

        if summary.dependency_ratio > self.thresholds.decouple_dependency_ratio {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Architecture,
                Priority::Medium,
                "Remove dependencies that restate an ordering the data flow already implies"
                    .to_string(),
                "Delete edges whose removal leaves the same reachability".to_string(),
                vec!["Implicit ordering is invisible in the graph view".to_string()],
            ));
        }

        let undocumented = workflow
            .stages
            .iter()
            .filter(|s| s.description.is_empty())
            .count();
        if undocumented > 0 {
            improvements.push(improvement(
                ids,
                goal,
                ImprovementKind::Maintainability,
                Priority::Low,
                format!("{undocumented} stage(s) have no description"),
                "Write a one-line description per stage stating what it consumes and produces"
                    .to_string(),
                vec![],
            ));
        }

        improvements
    }
}

fn improvement(
    ids: &mut IdGen,
    goal: Goal,
    kind: ImprovementKind,
    priority: Priority,
    description: String,
    implementation: String,
    tradeoffs: Vec<String>,
) -> Improvement {
    Improvement {
        id: ids.next("imp"),
        kind,
        priority,
        description,
        implementation,
        tradeoffs,
        goal_alignment: goal_alignment(goal, kind),
    }
}

/// Guaranteed minimum: the advisor never returns an empty improvement list.
fn fallback_improvement(goal: Goal, ids: &mut IdGen) -> Improvement {
    match goal {
        Goal::Reliability => improvement(
            ids,
            goal,
            ImprovementKind::Reliability,
            Priority::Medium,
            "Add health checks and failure alerts to the workflow's stages".to_string(),
            "Start with liveness signals on entry and terminal stages".to_string(),
            vec!["Monitoring only helps if someone owns the alerts".to_string()],
        ),
        Goal::Cost => improvement(
            ids,
            goal,
            ImprovementKind::Cost,
            Priority::Medium,
            "Profile per-stage resource usage to find where the spend actually goes".to_string(),
            "Record duration and resource consumption per stage over a representative week"
                .to_string(),
            vec!["Profiling itself adds a small overhead".to_string()],
        ),
        Goal::Simplicity => improvement(
            ids,
            goal,
            ImprovementKind::Maintainability,
            Priority::Medium,
            "Document and standardize the interfaces between stages".to_string(),
            "Write down what each stage consumes and produces, then align the outliers"
                .to_string(),
            vec![],
        ),
    }
}

fn score_confidence(risk: &RiskOutput, suggestion_count: usize) -> Confidence {
    let mut value = 0.8;
    if risk.finding_count() > 0 {
        value += 0.05;
    }
    if suggestion_count > 0 {
        value += 0.05;
    }
    if suggestion_count > 15 {
        value -= 0.1;
    }
    if suggestion_count > 25 {
        value -= 0.1;
    }
    Confidence::clamped(value)
}
