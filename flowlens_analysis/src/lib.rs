//! Flowlens analysis
//!
//! The goal-conditioned analysis stages (risk, optimization, critic), the
//! external collaborator seams and the orchestrating pipeline. Heuristics
//! are deterministic: the same workflow text and goal always produce the
//! same findings.

// Module declarations
pub mod config;
pub mod critic;
pub mod keywords;
pub mod optimize;
pub mod pipeline;
pub mod provider;
pub mod risk;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export main types
pub use config::{AnalysisMode, AnalysisThresholds, EngineConfig};
pub use critic::{similarity, Critic};
pub use optimize::{goal_alignment, OptimizationAdvisor};
pub use pipeline::{AnalysisEngine, AnalysisOutcome, PipelinePhase};
pub use provider::{
    complete_with_retry, execute_with_retry, CompletionProvider, NetworkProbe, RetryConfig,
};
pub use risk::RiskAnalyzer;

/// Version of the analysis crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
