//! Flowlens core
//!
//! Workflow analysis foundations: the graph model, the structural analysis
//! toolkit, the goal-aware result cache and the parser collaborator seam.

// Module declarations
pub mod cache;
pub mod confidence;
pub mod error;
pub mod findings;
pub mod graph;
pub mod model;
pub mod parser;

// Re-export main types
pub use cache::{
    fingerprint, AnalysisCache, CacheComponent, CacheConfig, CacheKey, CacheStats, CachedValue,
    ReuseEstimate,
};

pub use confidence::{Confidence, ConfidenceError};

pub use error::{
    AnalysisError, GraphViolation, InputError, ParseError, ProviderError, Result,
};

pub use findings::{
    AlternativePerspective, AnalysisResult, AssumptionScope, Bottleneck, BottleneckKind,
    ChallengedAssumption, CounterArgument, CriticismOutput, IdGen, Impact, Improvement,
    ImprovementKind, MissingStep, MissingStepKind, OptimizationOutput, OverengineeringDetection,
    OverengineeringKind, Priority, Risk, RiskKind, RiskOutput, Severity, TargetKind,
};

pub use graph::{ContentionGroup, StageGraph};

pub use model::{
    BackoffStrategy, Dependency, DependencyKind, Goal, GraphMetadata, GraphSummary, Resource,
    RetryPolicy, Stage, StageKind, Trigger, TriggerKind, WorkflowGraph,
};

pub use parser::{DocumentParser, WorkflowParser};

/// Version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
