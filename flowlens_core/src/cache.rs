//! Goal-aware result caching with LRU eviction and TTL expiration.
//!
//! Keyed by (content fingerprint of the raw workflow text, goal, pipeline
//! component). Parsing is goal-independent, so a parse stored under any goal
//! can be reused when only the goal changes; every other component is
//! specific to its (text, goal) pair. Entry writes are atomic behind one
//! RwLock; readers never observe a partially written entry, and entries are
//! replaced whole rather than mutated in place.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::findings::{AnalysisResult, CriticismOutput, OptimizationOutput, RiskOutput};
use crate::model::{Goal, WorkflowGraph};

/// Content fingerprint of raw workflow text (SHA-256, hex)
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// A named pipeline stage whose prior result can be reused
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheComponent {
    Parsing,
    RiskAnalysis,
    Optimization,
    Criticism,
    CompleteAnalysis,
}

impl CacheComponent {
    /// Fixed share of pipeline cost saved when this component hits,
    /// in percent. Used by the reuse estimation API only.
    pub fn reuse_weight(self) -> f64 {
        match self {
            CacheComponent::Parsing => 25.0,
            CacheComponent::RiskAnalysis => 30.0,
            CacheComponent::Optimization => 30.0,
            CacheComponent::Criticism => 15.0,
            CacheComponent::CompleteAnalysis => 95.0,
        }
    }

    /// Per-stage components, excluding the complete result
    pub const STAGES: [CacheComponent; 4] = [
        CacheComponent::RiskAnalysis,
        CacheComponent::Optimization,
        CacheComponent::Criticism,
        CacheComponent::Parsing,
    ];
}

impl std::fmt::Display for CacheComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CacheComponent::Parsing => "parsing",
            CacheComponent::RiskAnalysis => "risk_analysis",
            CacheComponent::Optimization => "optimization",
            CacheComponent::Criticism => "criticism",
            CacheComponent::CompleteAnalysis => "complete_analysis",
        };
        write!(f, "{name}")
    }
}

/// Cache key: one component of one (text, goal) analysis
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub fingerprint: String,
    pub goal: Goal,
    pub component: CacheComponent,
}

impl CacheKey {
    pub fn new(fingerprint: impl Into<String>, goal: Goal, component: CacheComponent) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            goal,
            component,
        }
    }
}

/// One cacheable sub-result
#[derive(Clone, Debug)]
pub enum CachedValue {
    Graph(WorkflowGraph),
    Risk(RiskOutput),
    Optimization(OptimizationOutput),
    Criticism(CriticismOutput),
    Complete(AnalysisResult),
}

/// Cache entry with creation time and a hit counter
#[derive(Clone, Debug)]
struct CacheEntry {
    value: CachedValue,
    created_at: Instant,
    hits: u64,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Keys in least-recently-used order (front = coldest)
    order: Vec<CacheKey>,
    total_hits: u64,
    total_misses: u64,
}

/// Cache sizing and expiry configuration
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    pub max_entries: usize,
    /// Time-to-live per entry
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 200,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Cache statistics snapshot
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// hits / (hits + misses); 0.0 before any lookup
    pub hit_rate: f64,
    /// Mean entry age in seconds
    pub average_age_secs: f64,
}

/// Outcome of the goal-change reuse estimation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReuseEstimate {
    pub reusable: bool,
    /// Sum of the reuse weights of the components that would hit
    pub estimated_speedup_pct: f64,
    pub components: Vec<CacheComponent>,
}

/// Thread-safe, goal-aware analysis result cache.
///
/// Injectable service rather than a singleton: the orchestrator receives one
/// at construction time and tests build their own with short TTLs.
#[derive(Clone)]
pub struct AnalysisCache {
    config: CacheConfig,
    inner: Arc<RwLock<CacheInner>>,
}

impl AnalysisCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                order: Vec::new(),
                total_hits: 0,
                total_misses: 0,
            })),
        }
    }

    /// Look up a component, honoring TTL and touching LRU order.
    pub async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();

        let live = match inner.entries.get(key) {
            Some(entry) => now.duration_since(entry.created_at) < self.config.ttl,
            None => {
                inner.total_misses += 1;
                return None;
            }
        };

        if !live {
            tracing::debug!(component = %key.component, "cache entry expired");
            inner.entries.remove(key);
            if let Some(pos) = inner.order.iter().position(|k| k == key) {
                inner.order.remove(pos);
            }
            inner.total_misses += 1;
            return None;
        }

        // Touch: move to the end of the LRU order.
        if let Some(pos) = inner.order.iter().position(|k| k == key) {
            let key = inner.order.remove(pos);
            inner.order.push(key);
        }
        inner.total_hits += 1;
        let entry = inner
            .entries
            .get_mut(key)
            .expect("entry liveness checked above");
        entry.hits += 1;
        Some(entry.value.clone())
    }

    /// Store a component result. A refreshed value replaces the old entry by
    /// key; it never mutates the stored entry in place.
    pub async fn insert(&self, key: CacheKey, value: CachedValue) {
        let mut inner = self.inner.write().await;

        if let Some(pos) = inner.order.iter().position(|k| *k == key) {
            inner.order.remove(pos);
        } else {
            while inner.order.len() >= self.config.max_entries && !inner.order.is_empty() {
                let coldest = inner.order.remove(0);
                tracing::warn!(component = %coldest.component, "evicting cache entry (capacity)");
                inner.entries.remove(&coldest);
            }
        }

        inner.order.push(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
                hits: 0,
            },
        );
    }

    /// Fetch a parsed graph for (text, goal), falling back to a parse stored
    /// under any other goal. Parsing is goal-independent; a cross-goal hit
    /// is re-stored under the current goal.
    ///
    /// Returns the graph and whether it came from another goal's entry.
    pub async fn get_parsed_graph(
        &self,
        fingerprint: &str,
        goal: Goal,
    ) -> Option<(WorkflowGraph, bool)> {
        let key = CacheKey::new(fingerprint, goal, CacheComponent::Parsing);
        if let Some(CachedValue::Graph(graph)) = self.get(&key).await {
            return Some((graph, false));
        }

        for other in Goal::ALL {
            if other == goal {
                continue;
            }
            let other_key = CacheKey::new(fingerprint, other, CacheComponent::Parsing);
            if let Some(CachedValue::Graph(graph)) = self.get(&other_key).await {
                self.insert(key, CachedValue::Graph(graph.clone())).await;
                tracing::debug!(from = %other, to = %goal, "reused parse across goals");
                return Some((graph, true));
            }
        }
        None
    }

    /// Drop every entry for one workflow text, across goals and components.
    pub async fn invalidate_text(&self, fingerprint: &str) {
        let mut inner = self.inner.write().await;
        inner.order.retain(|k| k.fingerprint != fingerprint);
        inner.entries.retain(|k, _| k.fingerprint != fingerprint);
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.order.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// Statistics snapshot
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let now = Instant::now();
        let lookups = inner.total_hits + inner.total_misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            inner.total_hits as f64 / lookups as f64
        };
        let average_age_secs = if inner.entries.is_empty() {
            0.0
        } else {
            let total: f64 = inner
                .entries
                .values()
                .map(|e| now.duration_since(e.created_at).as_secs_f64())
                .sum();
            total / inner.entries.len() as f64
        };
        CacheStats {
            total_entries: inner.entries.len(),
            total_hits: inner.total_hits,
            total_misses: inner.total_misses,
            hit_rate,
            average_age_secs,
        }
    }

    /// Estimate the speed-up of re-analyzing `text` under `new_goal` after a
    /// prior run under `old_goal`.
    ///
    /// Pure read: does not touch hit/miss counters or LRU order. Weights are
    /// fixed per component; a live complete result dominates everything else.
    pub async fn estimate_reuse(
        &self,
        old_goal: Goal,
        new_goal: Goal,
        text: &str,
    ) -> ReuseEstimate {
        let fp = fingerprint(text);
        let inner = self.inner.read().await;
        let now = Instant::now();
        let live = |key: &CacheKey| -> bool {
            inner
                .entries
                .get(key)
                .map(|e| now.duration_since(e.created_at) < self.config.ttl)
                .unwrap_or(false)
        };

        let complete = CacheKey::new(fp.clone(), new_goal, CacheComponent::CompleteAnalysis);
        if live(&complete) {
            return ReuseEstimate {
                reusable: true,
                estimated_speedup_pct: CacheComponent::CompleteAnalysis.reuse_weight(),
                components: vec![CacheComponent::CompleteAnalysis],
            };
        }

        let mut components = Vec::new();
        let mut pct = 0.0;

        for component in [
            CacheComponent::RiskAnalysis,
            CacheComponent::Optimization,
            CacheComponent::Criticism,
        ] {
            if live(&CacheKey::new(fp.clone(), new_goal, component)) {
                components.push(component);
                pct += component.reuse_weight();
            }
        }

        // Parsing is goal-independent: a parse stored under the old goal (or
        // any other goal) hits for the new one.
        let parse_hit = Goal::ALL
            .iter()
            .any(|&g| live(&CacheKey::new(fp.clone(), g, CacheComponent::Parsing)));
        if parse_hit {
            components.push(CacheComponent::Parsing);
            pct += CacheComponent::Parsing.reuse_weight();
        }
        tracing::debug!(%old_goal, %new_goal, speedup = pct, "reuse estimate");

        ReuseEstimate {
            reusable: !components.is_empty(),
            estimated_speedup_pct: pct,
            components,
        }
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphMetadata, Stage, StageKind};

    fn graph(name: &str) -> WorkflowGraph {
        WorkflowGraph {
            stages: vec![Stage {
                id: "s1".to_string(),
                name: name.to_string(),
                description: String::new(),
                kind: StageKind::Task,
                config: Default::default(),
                depends_on: Vec::new(),
                resources: Vec::new(),
                retry_policy: None,
            }],
            dependencies: Vec::new(),
            triggers: Vec::new(),
            resources: Vec::new(),
            metadata: GraphMetadata::default(),
        }
    }

    fn small_cache(max_entries: usize, ttl: Duration) -> AnalysisCache {
        AnalysisCache::new(CacheConfig { max_entries, ttl })
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 64);
    }

    #[tokio::test]
    async fn test_insert_get_roundtrip() {
        let cache = AnalysisCache::default();
        let key = CacheKey::new("fp", Goal::Cost, CacheComponent::Parsing);
        cache
            .insert(key.clone(), CachedValue::Graph(graph("wf")))
            .await;

        match cache.get(&key).await {
            Some(CachedValue::Graph(g)) => assert_eq!(g.stages[0].name, "wf"),
            other => panic!("expected graph hit, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = small_cache(10, Duration::from_secs(60));
        let key = CacheKey::new("fp", Goal::Cost, CacheComponent::Parsing);
        cache
            .insert(key.clone(), CachedValue::Graph(graph("wf")))
            .await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get(&key).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction_prefers_cold_entries() {
        let cache = small_cache(2, Duration::from_secs(60));
        let k1 = CacheKey::new("fp1", Goal::Cost, CacheComponent::Parsing);
        let k2 = CacheKey::new("fp2", Goal::Cost, CacheComponent::Parsing);
        let k3 = CacheKey::new("fp3", Goal::Cost, CacheComponent::Parsing);

        cache.insert(k1.clone(), CachedValue::Graph(graph("1"))).await;
        cache.insert(k2.clone(), CachedValue::Graph(graph("2"))).await;
        // Touch k1 so k2 becomes the coldest.
        assert!(cache.get(&k1).await.is_some());
        cache.insert(k3.clone(), CachedValue::Graph(graph("3"))).await;

        assert!(cache.get(&k2).await.is_none());
        assert!(cache.get(&k1).await.is_some());
        assert!(cache.get(&k3).await.is_some());
    }

    #[tokio::test]
    async fn test_cross_goal_parse_reuse() {
        let cache = AnalysisCache::default();
        let key = CacheKey::new("fp", Goal::Reliability, CacheComponent::Parsing);
        cache.insert(key, CachedValue::Graph(graph("wf"))).await;

        let (g, cross_goal) = cache
            .get_parsed_graph("fp", Goal::Simplicity)
            .await
            .expect("cross-goal reuse");
        assert!(cross_goal);
        assert_eq!(g.stages[0].name, "wf");

        // Re-stored under the new goal: the next lookup is a direct hit.
        let (_, cross_goal) = cache
            .get_parsed_graph("fp", Goal::Simplicity)
            .await
            .expect("direct hit");
        assert!(!cross_goal);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = AnalysisCache::default();
        let key = CacheKey::new("fp", Goal::Cost, CacheComponent::Parsing);
        assert!(cache.get(&key).await.is_none());
        cache
            .insert(key.clone(), CachedValue::Graph(graph("wf")))
            .await;
        assert!(cache.get(&key).await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_hits, 1);
        assert_eq!(stats.total_misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalidate_text_removes_all_goals() {
        let cache = AnalysisCache::default();
        for goal in Goal::ALL {
            cache
                .insert(
                    CacheKey::new("fp", goal, CacheComponent::Parsing),
                    CachedValue::Graph(graph("wf")),
                )
                .await;
        }
        cache.invalidate_text("fp").await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_estimate_reuse_weights() {
        let cache = AnalysisCache::default();
        let none = cache
            .estimate_reuse(Goal::Cost, Goal::Simplicity, "text")
            .await;
        assert!(!none.reusable);
        assert_eq!(none.estimated_speedup_pct, 0.0);

        let fp = fingerprint("text");
        cache
            .insert(
                CacheKey::new(fp.clone(), Goal::Cost, CacheComponent::Parsing),
                CachedValue::Graph(graph("wf")),
            )
            .await;

        let parse_only = cache
            .estimate_reuse(Goal::Cost, Goal::Simplicity, "text")
            .await;
        assert!(parse_only.reusable);
        assert_eq!(parse_only.estimated_speedup_pct, 25.0);
        assert_eq!(parse_only.components, vec![CacheComponent::Parsing]);
    }

    #[tokio::test]
    async fn test_estimate_reuse_complete_result_dominates() {
        let cache = AnalysisCache::default();
        let fp = fingerprint("text");
        let result = AnalysisResult {
            goal: Goal::Cost,
            graph: graph("wf"),
            risk: RiskOutput::degraded(),
            optimization: OptimizationOutput::degraded(&graph("wf")),
            criticism: CriticismOutput::degraded(),
            confidence: crate::confidence::Confidence::floor(),
            success: true,
            failed_stages: Vec::new(),
        };
        cache
            .insert(
                CacheKey::new(fp, Goal::Cost, CacheComponent::CompleteAnalysis),
                CachedValue::Complete(result),
            )
            .await;

        let estimate = cache.estimate_reuse(Goal::Cost, Goal::Cost, "text").await;
        assert_eq!(estimate.estimated_speedup_pct, 95.0);
        assert_eq!(estimate.components, vec![CacheComponent::CompleteAnalysis]);
    }
}
