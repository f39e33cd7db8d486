//! Workflow graph model
//!
//! The structural description consumed by every analysis stage. A graph is
//! immutable once parsed for a given run; the optimization stage produces a
//! *refined* graph as a new value rather than mutating the input.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GraphViolation;

/// Optimization lens that reweights every heuristic.
///
/// Closed enumeration by design: goal-specific branching and the alignment
/// weight matrix key off this, so an open string value would scatter
/// unvalidated comparisons through the stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Reliability,
    Cost,
    Simplicity,
}

impl Goal {
    /// All goals, in a fixed order (used for cross-goal cache probing)
    pub const ALL: [Goal; 3] = [Goal::Reliability, Goal::Cost, Goal::Simplicity];

    /// Parse a goal from user text.
    ///
    /// The engine API takes the enum directly; this is the boundary for
    /// callers arriving with free text.
    pub fn parse(text: &str) -> Result<Self, crate::error::InputError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "reliability" => Ok(Goal::Reliability),
            "cost" => Ok(Goal::Cost),
            "simplicity" => Ok(Goal::Simplicity),
            other => Err(crate::error::InputError::InvalidGoal(other.to_string())),
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Goal::Reliability => write!(f, "reliability"),
            Goal::Cost => write!(f, "cost"),
            Goal::Simplicity => write!(f, "simplicity"),
        }
    }
}

/// Kind of a workflow stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    #[default]
    Task,
    Condition,
    Parallel,
    Sequential,
    Loop,
}

/// Kind of a dependency edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    #[default]
    Sequential,
    Conditional,
    Resource,
    Data,
}

/// Backoff shape for a declared retry policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// Retry policy declared on a stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffStrategy,
    /// Error classes this policy retries on; empty means the policy is
    /// declared but never fires, which the risk analyzer flags.
    #[serde(default)]
    pub retry_on: Vec<String>,
}

/// A named unit of work in the workflow graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: StageKind,
    /// Free-form configuration map. BTreeMap keeps serialization order
    /// stable, which the critic's duplicate-stage similarity check relies on.
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
    /// Dependency ids declared inline on the stage (parser convenience;
    /// merged with the explicit dependency list when building the graph).
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Resource ids this stage uses
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
}

impl Stage {
    /// Stage name and description joined for keyword matching
    pub fn searchable_text(&self) -> String {
        let mut text = self.name.to_ascii_lowercase();
        if !self.description.is_empty() {
            text.push(' ');
            text.push_str(&self.description.to_ascii_lowercase());
        }
        text
    }
}

/// Directed edge between two stages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub condition: Option<String>,
}

/// Kind of a workflow trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    #[default]
    Manual,
    Schedule,
    Event,
    Webhook,
}

/// Auxiliary trigger entity; consumed by heuristics, never mutated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: TriggerKind,
    #[serde(default)]
    pub schedule: Option<String>,
}

/// Auxiliary resource entity; consumed by heuristics, never mutated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
}

/// Workflow-level metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Structural description of a multi-stage process
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub metadata: GraphMetadata,
}

impl WorkflowGraph {
    /// Check the graph invariants: at least one stage, unique stage ids,
    /// and every dependency endpoint referencing a declared stage.
    pub fn validate(&self) -> Result<(), Vec<GraphViolation>> {
        let mut violations = Vec::new();

        if self.stages.is_empty() {
            violations.push(GraphViolation::NoStages);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.id.as_str()) {
                violations.push(GraphViolation::DuplicateStageId(stage.id.clone()));
            }
        }

        for dep in &self.dependencies {
            if !seen.contains(dep.from.as_str()) {
                violations.push(GraphViolation::UnknownDependencySource(dep.from.clone()));
            }
            if !seen.contains(dep.to.as_str()) {
                violations.push(GraphViolation::UnknownDependencyTarget(dep.to.clone()));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Summary metrics used by several heuristics
    pub fn summary(&self) -> GraphSummary {
        let stage_count = self.stages.len();
        let dependency_count = self.dependencies.len();

        let mut has_incoming: HashSet<&str> = HashSet::new();
        let mut has_outgoing: HashSet<&str> = HashSet::new();
        for dep in &self.dependencies {
            has_outgoing.insert(dep.from.as_str());
            has_incoming.insert(dep.to.as_str());
        }
        for stage in &self.stages {
            for dep_id in &stage.depends_on {
                has_outgoing.insert(dep_id.as_str());
                has_incoming.insert(stage.id.as_str());
            }
        }

        let terminal_stages: Vec<String> = self
            .stages
            .iter()
            .filter(|s| !has_outgoing.contains(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        let entry_stages: Vec<String> = self
            .stages
            .iter()
            .filter(|s| !has_incoming.contains(s.id.as_str()))
            .map(|s| s.id.clone())
            .collect();
        let independent_stages: Vec<String> = self
            .stages
            .iter()
            .filter(|s| {
                !has_incoming.contains(s.id.as_str()) && !has_outgoing.contains(s.id.as_str())
            })
            .map(|s| s.id.clone())
            .collect();

        let dependency_ratio = if stage_count == 0 {
            0.0
        } else {
            dependency_count as f64 / stage_count as f64
        };

        GraphSummary {
            stage_count,
            dependency_count,
            trigger_count: self.triggers.len(),
            resource_count: self.resources.len(),
            dependency_ratio,
            entry_stages,
            terminal_stages,
            independent_stages,
        }
    }
}

/// Graph-level metrics shared by the optimization and critic stages
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub stage_count: usize,
    pub dependency_count: usize,
    pub trigger_count: usize,
    pub resource_count: usize,
    /// dependencies per stage
    pub dependency_ratio: f64,
    pub entry_stages: Vec<String>,
    pub terminal_stages: Vec<String>,
    /// Stages with neither incoming nor outgoing dependencies
    pub independent_stages: Vec<String>,
}
