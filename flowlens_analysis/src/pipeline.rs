//! Analysis pipeline orchestrator
//!
//! Drives validation, parsing and the three analysis stages in order, with
//! partial-failure tolerance: a failed downstream stage is replaced by its
//! degraded default and recorded in `failed_stages`, and the pipeline keeps
//! going. Only input validation, parse failures and pre-flight connectivity
//! abort the whole request.

use std::sync::Arc;

use flowlens_core::{
    fingerprint, AnalysisCache, AnalysisError, AnalysisResult, CacheComponent, CacheKey,
    CacheStats, CachedValue, Confidence, CriticismOutput, DocumentParser, Goal, InputError,
    OptimizationOutput, ProviderError, Result, ReuseEstimate, RiskOutput, StageGraph,
    WorkflowGraph, WorkflowParser,
};

use crate::config::{AnalysisMode, EngineConfig};
use crate::critic::Critic;
use crate::optimize::OptimizationAdvisor;
use crate::provider::{complete_with_retry, execute_with_retry, CompletionProvider, NetworkProbe};
use crate::risk::RiskAnalyzer;

/// Pipeline phases in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelinePhase {
    Validating,
    Parsing,
    RiskAnalysis,
    Optimization,
    Criticism,
    Aggregating,
    Done,
    Failed,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelinePhase::Validating => "validating",
            PipelinePhase::Parsing => "parsing",
            PipelinePhase::RiskAnalysis => "risk_analysis",
            PipelinePhase::Optimization => "optimization",
            PipelinePhase::Criticism => "criticism",
            PipelinePhase::Aggregating => "aggregating",
            PipelinePhase::Done => "done",
            PipelinePhase::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// A completed analysis plus run metadata that is not part of the cached
/// result. Cache hits live here so that a cached result stays bit-identical
/// to the run that produced it.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// Components served from cache during this run
    pub cache_hits: Vec<CacheComponent>,
}

const SYSTEM_PROMPT: &str = "You are a workflow analysis assistant. Comment on the findings \
you are given: confirm, refute or extend them in a short paragraph of plain prose.";

/// Confidence penalty per failed stage
fn failure_penalty(mode: AnalysisMode) -> f64 {
    match mode {
        AnalysisMode::RuleBased => 0.2,
        AnalysisMode::ModelAssisted => 0.25,
    }
}

/// Goal-conditioned workflow analysis engine.
///
/// Collaborators are injected: parser, optional completion provider,
/// optional network probe and the result cache. Cloneable handles make the
/// engine cheap to share across tasks.
pub struct AnalysisEngine {
    config: EngineConfig,
    parser: Arc<dyn WorkflowParser>,
    provider: Option<Arc<dyn CompletionProvider>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    cache: AnalysisCache,
}

impl AnalysisEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = AnalysisCache::new(config.cache.clone());
        Self {
            config,
            parser: Arc::new(DocumentParser::new()),
            provider: None,
            probe: None,
            cache,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn WorkflowParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn NetworkProbe>) -> Self {
        self.probe = probe.into();
        self
    }

    /// Analyze one workflow text under one goal.
    pub async fn analyze(&self, text: &str, goal: Goal) -> Result<AnalysisOutcome> {
        let mut phase = PipelinePhase::Validating;
        tracing::info!(%phase, %goal, "pipeline phase");
        self.validate_input(text)?;
        self.preflight().await?;

        let fp = fingerprint(text);
        let complete_key = CacheKey::new(fp.clone(), goal, CacheComponent::CompleteAnalysis);
        if let Some(CachedValue::Complete(result)) = self.cache.get(&complete_key).await {
            tracing::info!(%goal, "serving complete analysis from cache");
            return Ok(AnalysisOutcome {
                result,
                cache_hits: vec![CacheComponent::CompleteAnalysis],
            });
        }

        let mut cache_hits = Vec::new();
        let mut failed_stages = Vec::new();

        phase = PipelinePhase::Parsing;
        tracing::info!(%phase, %goal, "pipeline phase");
        let graph = match self.cache.get_parsed_graph(&fp, goal).await {
            Some((graph, _cross_goal)) => {
                cache_hits.push(CacheComponent::Parsing);
                graph
            }
            None => {
                let graph = self.parser.parse(text).await?;
                self.cache
                    .insert(
                        CacheKey::new(fp.clone(), goal, CacheComponent::Parsing),
                        CachedValue::Graph(graph.clone()),
                    )
                    .await;
                graph
            }
        };
        let stage_graph = StageGraph::from_workflow(&graph);
        let cycles = stage_graph.detect_cycles();
        if !cycles.is_empty() {
            // Cycles are legal input (loops exist in real workflows) but the
            // chain and reachability heuristics treat them conservatively.
            tracing::warn!(count = cycles.len(), "workflow contains dependency cycles");
        }

        phase = PipelinePhase::RiskAnalysis;
        tracing::info!(%phase, %goal, "pipeline phase");
        let risk_key = CacheKey::new(fp.clone(), goal, CacheComponent::RiskAnalysis);
        let risk = match self.cache.get(&risk_key).await {
            Some(CachedValue::Risk(output)) => {
                cache_hits.push(CacheComponent::RiskAnalysis);
                output
            }
            _ => {
                let mut output =
                    RiskAnalyzer::new(&self.config.thresholds).analyze(&graph, &stage_graph, goal);
                match self
                    .stage_narrative(PipelinePhase::RiskAnalysis, risk_prompt(&graph, &output))
                    .await
                {
                    Ok(narrative) => {
                        output.narrative = narrative;
                        self.cache
                            .insert(risk_key, CachedValue::Risk(output.clone()))
                            .await;
                    }
                    Err(error) => {
                        self.record_failure(PipelinePhase::RiskAnalysis, error, &mut failed_stages);
                        output = RiskOutput::degraded();
                    }
                }
                output
            }
        };

        phase = PipelinePhase::Optimization;
        tracing::info!(%phase, %goal, "pipeline phase");
        let opt_key = CacheKey::new(fp.clone(), goal, CacheComponent::Optimization);
        let optimization = match self.cache.get(&opt_key).await {
            Some(CachedValue::Optimization(output)) => {
                cache_hits.push(CacheComponent::Optimization);
                output
            }
            _ => {
                let mut output = OptimizationAdvisor::new(&self.config.thresholds)
                    .analyze(&graph, &stage_graph, goal, &risk);
                match self
                    .stage_narrative(
                        PipelinePhase::Optimization,
                        optimization_prompt(&graph, &output),
                    )
                    .await
                {
                    Ok(narrative) => {
                        output.narrative = narrative;
                        self.cache
                            .insert(opt_key, CachedValue::Optimization(output.clone()))
                            .await;
                    }
                    Err(error) => {
                        self.record_failure(PipelinePhase::Optimization, error, &mut failed_stages);
                        output = OptimizationOutput::degraded(&graph);
                    }
                }
                output
            }
        };

        phase = PipelinePhase::Criticism;
        tracing::info!(%phase, %goal, "pipeline phase");
        let critic_key = CacheKey::new(fp.clone(), goal, CacheComponent::Criticism);
        let criticism = match self.cache.get(&critic_key).await {
            Some(CachedValue::Criticism(output)) => {
                cache_hits.push(CacheComponent::Criticism);
                output
            }
            _ => {
                let mut output = Critic::new(&self.config.thresholds)
                    .criticize(&graph, goal, &risk, &optimization);
                match self
                    .stage_narrative(PipelinePhase::Criticism, criticism_prompt(&output))
                    .await
                {
                    Ok(narrative) => {
                        output.narrative = narrative;
                        self.cache
                            .insert(critic_key, CachedValue::Criticism(output.clone()))
                            .await;
                    }
                    Err(error) => {
                        self.record_failure(PipelinePhase::Criticism, error, &mut failed_stages);
                        output = CriticismOutput::degraded();
                    }
                }
                output
            }
        };

        phase = PipelinePhase::Aggregating;
        tracing::info!(%phase, %goal, failed = failed_stages.len(), "pipeline phase");
        let mean = (risk.confidence.get() + optimization.confidence.get()
            + criticism.confidence.get())
            / 3.0;
        let confidence = Confidence::clamped(
            mean - failure_penalty(self.config.mode) * failed_stages.len() as f64,
        );
        let success = failed_stages.len() < 3;

        let result = AnalysisResult {
            goal,
            graph,
            risk,
            optimization,
            criticism,
            confidence,
            success,
            failed_stages,
        };

        // Cache the complete result only when every stage ran clean, so a
        // transient provider outage is not frozen in for the TTL.
        if result.failed_stages.is_empty() {
            self.cache
                .insert(complete_key, CachedValue::Complete(result.clone()))
                .await;
        }

        phase = PipelinePhase::Done;
        tracing::info!(
            %phase,
            %goal,
            success = result.success,
            confidence = result.confidence.get(),
            "analysis complete"
        );
        Ok(AnalysisOutcome { result, cache_hits })
    }

    /// Re-analyze the same text under a different goal, reusing whatever the
    /// cache still holds (at minimum the goal-independent parse).
    pub async fn reanalyze(
        &self,
        text: &str,
        old_goal: Goal,
        new_goal: Goal,
    ) -> Result<AnalysisOutcome> {
        let estimate = self.cache.estimate_reuse(old_goal, new_goal, text).await;
        tracing::info!(
            %old_goal,
            %new_goal,
            reusable = estimate.reusable,
            speedup_pct = estimate.estimated_speedup_pct,
            "goal change"
        );
        self.analyze(text, new_goal).await
    }

    /// Estimate how much of a prior run a goal change can reuse.
    pub async fn estimate_reuse(
        &self,
        text: &str,
        old_goal: Goal,
        new_goal: Goal,
    ) -> ReuseEstimate {
        self.cache.estimate_reuse(old_goal, new_goal, text).await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Drop cached entries for one workflow text across all goals.
    pub async fn invalidate(&self, text: &str) {
        self.cache.invalidate_text(&fingerprint(text)).await;
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    fn validate_input(&self, text: &str) -> std::result::Result<(), InputError> {
        if text.trim().is_empty() {
            return Err(InputError::Empty);
        }
        if text.len() < self.config.min_text_len {
            return Err(InputError::TooShort {
                len: text.len(),
                min: self.config.min_text_len,
            });
        }
        if text.len() > self.config.max_text_len {
            return Err(InputError::Oversized {
                len: text.len(),
                max: self.config.max_text_len,
            });
        }
        if text
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        {
            return Err(InputError::ControlCharacters);
        }
        Ok(())
    }

    /// Pre-flight checks: provider configured in model-assisted mode, and
    /// the network probe (when one is wired) passing within its retry budget.
    async fn preflight(&self) -> Result<()> {
        if self.config.mode == AnalysisMode::ModelAssisted && self.provider.is_none() {
            return Err(ProviderError::Configuration(
                "model-assisted mode requires a completion provider".to_string(),
            )
            .into());
        }
        if let Some(probe) = &self.probe {
            execute_with_retry(|| probe.check(), &self.config.probe_retry, |_| true)
                .await
                .map_err(|e| AnalysisError::Connectivity(e.to_string()))?;
        }
        Ok(())
    }

    /// In model-assisted mode, one completion call per stage. The provider's
    /// failure (after retries) is the only way a stage can fail.
    async fn stage_narrative(
        &self,
        stage: PipelinePhase,
        prompt: String,
    ) -> std::result::Result<Option<String>, ProviderError> {
        if self.config.mode != AnalysisMode::ModelAssisted {
            return Ok(None);
        }
        let provider = self.provider.as_ref().ok_or_else(|| {
            ProviderError::Configuration("completion provider disappeared mid-run".to_string())
        })?;
        tracing::debug!(%stage, "requesting stage narrative");
        complete_with_retry(
            provider.as_ref(),
            &self.config.provider_retry,
            &prompt,
            Some(SYSTEM_PROMPT),
        )
        .await
        .map(Some)
    }

    fn record_failure(
        &self,
        stage: PipelinePhase,
        error: ProviderError,
        failed_stages: &mut Vec<String>,
    ) {
        tracing::warn!(%stage, %error, "stage failed, substituting degraded output");
        failed_stages.push(stage.to_string());
    }
}

fn risk_prompt(graph: &WorkflowGraph, output: &RiskOutput) -> String {
    format!(
        "Review the risks found in workflow '{}' ({} stages): {} risk(s), {} bottleneck(s). \
         Top findings: {}",
        graph.metadata.name,
        graph.stages.len(),
        output.risks.len(),
        output.bottlenecks.len(),
        output
            .risks
            .iter()
            .take(3)
            .map(|r| r.description.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    )
}

fn optimization_prompt(graph: &WorkflowGraph, output: &OptimizationOutput) -> String {
    format!(
        "Review the improvements suggested for workflow '{}': {} improvement(s), {} missing step(s). \
         Top suggestions: {}",
        graph.metadata.name,
        output.improvements.len(),
        output.missing_steps.len(),
        output
            .improvements
            .iter()
            .take(3)
            .map(|i| i.description.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    )
}

fn criticism_prompt(output: &CriticismOutput) -> String {
    format!(
        "Critique the critique: {} counter-argument(s), {} challenged assumption(s), \
         {} overengineering detection(s).",
        output.counter_arguments.len(),
        output.challenged_assumptions.len(),
        output.overengineering.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    const WORKFLOW_YAML: &str = r#"
stages:
  - id: build
    name: Build
  - id: test
    name: Test
  - id: deploy
    name: Deploy to production
dependencies:
  - from: build
    to: test
  - from: test
    to: deploy
"#;

    fn rule_based() -> AnalysisEngine {
        AnalysisEngine::new(EngineConfig::default())
    }

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&str>,
        ) -> std::result::Result<String, ProviderError> {
            Ok("looks reasonable".to_string())
        }
    }

    /// Fails on prompts whose text contains the configured marker.
    struct SelectiveProvider {
        fail_on: &'static str,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CompletionProvider for SelectiveProvider {
        async fn complete(
            &self,
            prompt: &str,
            _system: Option<&str>,
        ) -> std::result::Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains(self.fail_on) {
                Err(ProviderError::Auth("denied".to_string()))
            } else {
                Ok("fine".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_rule_based_analysis_end_to_end() {
        let outcome = rule_based()
            .analyze(WORKFLOW_YAML, Goal::Reliability)
            .await
            .unwrap();

        let result = &outcome.result;
        assert!(result.success);
        assert!(result.failed_stages.is_empty());
        assert_eq!(result.goal, Goal::Reliability);
        assert!(!result.optimization.improvements.is_empty());
        assert!(result.risk.narrative.is_none());
        assert!(outcome.cache_hits.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = rule_based().analyze("   ", Goal::Cost).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Input(InputError::Empty)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_short_input_rejected() {
        let err = rule_based().analyze("stages: []", Goal::Cost).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::TooShort { .. })
        ));
    }

    #[tokio::test]
    async fn test_control_characters_rejected() {
        let text = format!("{WORKFLOW_YAML}\u{0007}");
        let err = rule_based().analyze(&text, Goal::Cost).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Input(InputError::ControlCharacters)
        ));
    }

    #[tokio::test]
    async fn test_parse_failure_is_fatal() {
        let err = rule_based()
            .analyze("{ this is not valid json at all", Goal::Cost)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_model_assisted_without_provider_is_configuration_error() {
        let engine = AnalysisEngine::new(
            EngineConfig::default().with_mode(AnalysisMode::ModelAssisted),
        );
        let err = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Provider(ProviderError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_model_assisted_attaches_narratives() {
        let engine = AnalysisEngine::new(
            EngineConfig::default().with_mode(AnalysisMode::ModelAssisted),
        )
        .with_provider(Arc::new(EchoProvider));

        let outcome = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap();
        assert!(outcome.result.success);
        assert_eq!(
            outcome.result.risk.narrative.as_deref(),
            Some("looks reasonable")
        );
        assert_eq!(
            outcome.result.criticism.narrative.as_deref(),
            Some("looks reasonable")
        );
    }

    #[tokio::test]
    async fn test_single_stage_failure_is_recovered() {
        let engine = AnalysisEngine::new(
            EngineConfig::default().with_mode(AnalysisMode::ModelAssisted),
        )
        .with_provider(Arc::new(SelectiveProvider {
            fail_on: "Review the improvements",
            calls: AtomicU32::new(0),
        }));

        let outcome = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap();
        let result = &outcome.result;

        assert!(result.success);
        assert_eq!(result.failed_stages, vec!["optimization"]);
        assert!(result.optimization.improvements.is_empty());
        assert_eq!(result.optimization.confidence.get(), 0.1);
        // Other stages are intact.
        assert!(result.risk.narrative.is_some());
        assert!(result.criticism.narrative.is_some());
    }

    #[tokio::test]
    async fn test_all_stages_failing_still_returns_result() {
        struct AlwaysFail;
        #[async_trait]
        impl CompletionProvider for AlwaysFail {
            async fn complete(
                &self,
                _prompt: &str,
                _system: Option<&str>,
            ) -> std::result::Result<String, ProviderError> {
                Err(ProviderError::Auth("no".to_string()))
            }
        }

        let engine = AnalysisEngine::new(
            EngineConfig::default().with_mode(AnalysisMode::ModelAssisted),
        )
        .with_provider(Arc::new(AlwaysFail));

        let outcome = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap();
        let result = &outcome.result;
        assert!(!result.success);
        assert_eq!(
            result.failed_stages,
            vec!["risk_analysis", "optimization", "criticism"]
        );
        assert_eq!(result.confidence.get(), 0.1);
    }

    #[tokio::test]
    async fn test_failed_runs_are_not_cached_whole() {
        struct AlwaysFail;
        #[async_trait]
        impl CompletionProvider for AlwaysFail {
            async fn complete(
                &self,
                _prompt: &str,
                _system: Option<&str>,
            ) -> std::result::Result<String, ProviderError> {
                Err(ProviderError::Auth("no".to_string()))
            }
        }

        let engine = AnalysisEngine::new(
            EngineConfig::default().with_mode(AnalysisMode::ModelAssisted),
        )
        .with_provider(Arc::new(AlwaysFail));

        let first = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap();
        assert!(!first.result.success);

        // The second run must recompute rather than serve the failed result.
        let second = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap();
        assert!(!second
            .cache_hits
            .contains(&CacheComponent::CompleteAnalysis));
    }

    #[tokio::test]
    async fn test_probe_failure_aborts_with_connectivity_error() {
        struct DeadProbe;
        #[async_trait]
        impl NetworkProbe for DeadProbe {
            async fn check(&self) -> anyhow::Result<()> {
                anyhow::bail!("network unreachable")
            }
        }

        let mut config = EngineConfig::default();
        config.probe_retry.max_attempts = 1;
        let engine = AnalysisEngine::new(config).with_probe(Arc::new(DeadProbe));

        let err = engine.analyze(WORKFLOW_YAML, Goal::Cost).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Connectivity(_)));
        assert!(err.guidance().contains("network"));
    }
}
