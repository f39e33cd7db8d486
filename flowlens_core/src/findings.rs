//! Analysis finding types
//!
//! Records produced by the risk, optimization and critic stages, the
//! per-stage output aggregates and the final `AnalysisResult`. All findings
//! carry deterministic counter-based ids (see [`IdGen`]) so identical inputs
//! produce bit-identical results.

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::model::{Goal, WorkflowGraph};

/// Severity of a risk; escalation never de-escalates
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// One level up, capped at critical
    pub fn escalate(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }
}

/// Impact of a bottleneck
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// One level up, capped at high
    pub fn escalate(self) -> Self {
        match self {
            Impact::Low => Impact::Medium,
            Impact::Medium | Impact::High => Impact::High,
        }
    }
}

/// Priority of an improvement or missing step
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskKind {
    SinglePointOfFailure,
    MissingRetry,
    ScalingIssue,
    Security,
    Data,
}

/// A risk finding from the risk analyzer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub kind: RiskKind,
    pub severity: Severity,
    pub description: String,
    pub affected_stages: Vec<String>,
    pub mitigation: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckKind {
    Sequential,
    Resource,
    Dependency,
    Network,
}

/// A structural bottleneck finding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub id: String,
    pub kind: BottleneckKind,
    pub description: String,
    pub affected_stages: Vec<String>,
    pub impact: Impact,
    pub suggestions: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementKind {
    Architecture,
    Performance,
    Reliability,
    Cost,
    Maintainability,
}

impl ImprovementKind {
    pub const ALL: [ImprovementKind; 5] = [
        ImprovementKind::Architecture,
        ImprovementKind::Performance,
        ImprovementKind::Reliability,
        ImprovementKind::Cost,
        ImprovementKind::Maintainability,
    ];
}

/// An improvement suggestion from the optimization advisor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub id: String,
    pub kind: ImprovementKind,
    pub priority: Priority,
    pub description: String,
    pub implementation: String,
    pub tradeoffs: Vec<String>,
    /// Goal-alignment score in [0.4, 1.0] from the fixed weight matrix
    pub goal_alignment: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingStepKind {
    Validation,
    ErrorHandling,
    Monitoring,
    Cleanup,
    Notification,
}

/// A step the workflow lacks, derived from a specific risk or bottleneck
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MissingStep {
    pub id: String,
    pub kind: MissingStepKind,
    pub description: String,
    /// Suggested insertion point: place the new step after this stage
    pub insert_after: Option<String>,
    pub priority: Priority,
    pub implementation: String,
}

/// What a counter-argument targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Risk,
    Improvement,
    Bottleneck,
    MissingStep,
}

/// A goal-conditioned rebuttal to a specific upstream finding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterArgument {
    pub id: String,
    pub target_id: String,
    pub target: TargetKind,
    pub argument: String,
    pub severity: Severity,
    pub tradeoffs: Vec<String>,
}

/// Whether a challenged assumption concerns the input or the analysis output
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssumptionScope {
    InputGraph,
    AnalysisOutput,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChallengedAssumption {
    pub id: String,
    pub scope: AssumptionScope,
    pub assumption: String,
    pub challenge: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverengineeringKind {
    ComplexityKeyword,
    OverAbstraction,
    PrematureOptimization,
    ExcessiveRedundancy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverengineeringDetection {
    pub id: String,
    pub kind: OverengineeringKind,
    pub description: String,
    /// Finding or stage ids this detection points at
    pub affected: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlternativePerspective {
    pub id: String,
    pub title: String,
    pub narrative: String,
}

/// Output of the risk analysis stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskOutput {
    pub risks: Vec<Risk>,
    pub bottlenecks: Vec<Bottleneck>,
    pub confidence: Confidence,
    /// Provider commentary when the stage ran model-assisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl RiskOutput {
    /// Degraded default used when the stage fails
    pub fn degraded() -> Self {
        Self {
            risks: Vec::new(),
            bottlenecks: Vec::new(),
            confidence: Confidence::floor(),
            narrative: None,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.risks.len() + self.bottlenecks.len()
    }
}

/// Output of the optimization stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptimizationOutput {
    pub improvements: Vec<Improvement>,
    pub missing_steps: Vec<MissingStep>,
    /// Original graph plus synthesized stages for high-priority missing steps
    pub refined_graph: WorkflowGraph,
    pub confidence: Confidence,
    /// Provider commentary when the stage ran model-assisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl OptimizationOutput {
    /// Degraded default: no suggestions, refined graph is the input unchanged
    pub fn degraded(graph: &WorkflowGraph) -> Self {
        Self {
            improvements: Vec::new(),
            missing_steps: Vec::new(),
            refined_graph: graph.clone(),
            confidence: Confidence::floor(),
            narrative: None,
        }
    }

    pub fn suggestion_count(&self) -> usize {
        self.improvements.len() + self.missing_steps.len()
    }
}

/// Output of the critic stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticismOutput {
    pub counter_arguments: Vec<CounterArgument>,
    pub challenged_assumptions: Vec<ChallengedAssumption>,
    pub overengineering: Vec<OverengineeringDetection>,
    pub alternatives: Vec<AlternativePerspective>,
    pub confidence: Confidence,
    /// Provider commentary when the stage ran model-assisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl CriticismOutput {
    pub fn degraded() -> Self {
        Self {
            counter_arguments: Vec::new(),
            challenged_assumptions: Vec::new(),
            overengineering: Vec::new(),
            alternatives: Vec::new(),
            confidence: Confidence::floor(),
            narrative: None,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.counter_arguments.len()
            + self.challenged_assumptions.len()
            + self.overengineering.len()
            + self.alternatives.len()
    }
}

/// Aggregate of one successful pipeline run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub goal: Goal,
    pub graph: WorkflowGraph,
    pub risk: RiskOutput,
    pub optimization: OptimizationOutput,
    pub criticism: CriticismOutput,
    /// Mean of the three stage confidences minus per-failure penalties
    pub confidence: Confidence,
    /// True when fewer than all downstream stages failed
    pub success: bool,
    /// Names of downstream stages that failed and were recovered
    pub failed_stages: Vec<String>,
}

/// Monotonic identifier generator threaded through a pipeline run.
///
/// Replaces the wall-clock ids of earlier designs so that output is
/// reproducible: the nth finding of a given prefix always gets the same id.
#[derive(Debug, Default)]
pub struct IdGen {
    next: u64,
}

impl IdGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{}-{}", prefix, self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_escalation_caps_at_critical() {
        assert_eq!(Severity::Low.escalate(), Severity::Medium);
        assert_eq!(Severity::Medium.escalate(), Severity::High);
        assert_eq!(Severity::High.escalate(), Severity::Critical);
        assert_eq!(Severity::Critical.escalate(), Severity::Critical);
    }

    #[test]
    fn test_impact_escalation_caps_at_high() {
        assert_eq!(Impact::Low.escalate(), Impact::Medium);
        assert_eq!(Impact::Medium.escalate(), Impact::High);
        assert_eq!(Impact::High.escalate(), Impact::High);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_id_gen_is_deterministic() {
        let mut ids = IdGen::new();
        assert_eq!(ids.next("risk"), "risk-1");
        assert_eq!(ids.next("risk"), "risk-2");
        assert_eq!(ids.next("imp"), "imp-3");

        let mut again = IdGen::new();
        assert_eq!(again.next("risk"), "risk-1");
    }

    #[test]
    fn test_degraded_outputs_report_floor_confidence() {
        assert_eq!(RiskOutput::degraded().confidence.get(), 0.1);
        assert_eq!(CriticismOutput::degraded().confidence.get(), 0.1);
    }
}
