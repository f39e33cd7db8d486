//! Engine configuration
//!
//! Threshold constants are configuration, not business rules: the numbers
//! match the behavior the heuristics were tuned against, but nothing else in
//! the engine depends on their exact values.

use flowlens_core::CacheConfig;

use crate::provider::RetryConfig;

/// Whether downstream stages consult the completion provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Heuristics only; the only possible external call is the optional
    /// network reachability probe.
    RuleBased,
    /// One completion call per downstream stage, layered on top of the
    /// rule-based heuristics.
    ModelAssisted,
}

/// Structural thresholds shared by the analysis stages
#[derive(Clone, Debug)]
pub struct AnalysisThresholds {
    /// Minimum chain length reported as a sequential bottleneck
    pub chain_bottleneck_len: usize,
    /// Chain length at which the bottleneck impact becomes high
    pub chain_high_impact_len: usize,
    /// Minimum fan-in reported as a dependency bottleneck
    pub fan_in_bottleneck: usize,
    /// Fan-in at which the bottleneck impact becomes high
    pub fan_in_high_impact: usize,
    /// A resource used by more than this many stages is a shared SPOF
    pub resource_spof_users: usize,
    /// Contention groups larger than this get high impact
    pub resource_group_high_impact: usize,
    /// Stage count above which a split is suggested
    pub split_stage_count: usize,
    /// Dependency/stage ratio above which decoupling is suggested
    pub decouple_dependency_ratio: f64,
    /// Independent stage count above which orchestration is suggested
    pub orchestration_independent: usize,
    /// Terminal stage count above which consolidated reporting is suggested
    pub reporting_terminal: usize,
    /// Outgoing edge count treated as high fan-out (reliability monitoring)
    pub high_fan_out: usize,
    /// Stage count the critic challenges as "too many stages"
    pub critic_many_stages: usize,
    /// Dependency ratio the critic challenges as "too dense"
    pub critic_dense_ratio: f64,
    /// Resource count the critic challenges
    pub critic_many_resources: usize,
    /// Trigger count the critic challenges
    pub critic_many_triggers: usize,
    /// High-severity risk count the critic challenges
    pub critic_many_high_risks: usize,
    /// High-priority improvement count the critic challenges
    pub critic_many_high_improvements: usize,
    /// Missing-step count the critic challenges
    pub critic_many_missing_steps: usize,
    /// Stage count above which a uniformly shallow graph is over-abstraction
    pub shallow_stage_count: usize,
    /// Config edit-distance similarity above which stages are near-duplicates
    pub duplicate_similarity: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            chain_bottleneck_len: 4,
            chain_high_impact_len: 6,
            fan_in_bottleneck: 4,
            fan_in_high_impact: 6,
            resource_spof_users: 2,
            resource_group_high_impact: 4,
            split_stage_count: 8,
            decouple_dependency_ratio: 1.5,
            orchestration_independent: 3,
            reporting_terminal: 2,
            high_fan_out: 2,
            critic_many_stages: 15,
            critic_dense_ratio: 2.0,
            critic_many_resources: 5,
            critic_many_triggers: 3,
            critic_many_high_risks: 5,
            critic_many_high_improvements: 5,
            critic_many_missing_steps: 4,
            shallow_stage_count: 8,
            duplicate_similarity: 0.7,
        }
    }
}

/// Top-level engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub mode: AnalysisMode,
    pub cache: CacheConfig,
    pub thresholds: AnalysisThresholds,
    /// Minimum workflow text length in bytes
    pub min_text_len: usize,
    /// Maximum workflow text length in bytes
    pub max_text_len: usize,
    /// Retry policy for completion calls (model-assisted mode)
    pub provider_retry: RetryConfig,
    /// Retry policy for the network reachability probe
    pub probe_retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::RuleBased,
            cache: CacheConfig::default(),
            thresholds: AnalysisThresholds::default(),
            min_text_len: 20,
            max_text_len: 512 * 1024,
            provider_retry: RetryConfig::model_assisted(),
            probe_retry: RetryConfig::probe(),
        }
    }
}

impl EngineConfig {
    /// Set the analysis mode (builder pattern)
    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_thresholds(mut self, thresholds: AnalysisThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}
