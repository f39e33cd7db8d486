//! Overengineering detection
//!
//! Four detectors: complexity vocabulary in the advice itself, uniformly
//! shallow graphs hiding behind many stages, optimization advice the goal
//! never asked for, and near-duplicate stages measured by config edit
//! distance.

use flowlens_core::{
    Goal, IdGen, ImprovementKind, OptimizationOutput, OverengineeringDetection,
    OverengineeringKind, WorkflowGraph,
};

use crate::config::AnalysisThresholds;
use crate::keywords::COMPLEXITY_KEYWORDS;

pub(super) fn detect(
    workflow: &WorkflowGraph,
    goal: Goal,
    optimization: &OptimizationOutput,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<OverengineeringDetection> {
    let mut detections = Vec::new();

    for imp in &optimization.improvements {
        let text = format!(
            "{} {}",
            imp.description.to_ascii_lowercase(),
            imp.implementation.to_ascii_lowercase()
        );
        if let Some(word) = COMPLEXITY_KEYWORDS.iter().find(|kw| text.contains(*kw)) {
            detections.push(OverengineeringDetection {
                id: ids.next("oe"),
                kind: OverengineeringKind::ComplexityKeyword,
                description: format!(
                    "Improvement '{}' sells itself with '{}'; complexity is a cost, not a feature",
                    imp.id, word
                ),
                affected: vec![imp.id.clone()],
            });
        }
    }

    if workflow.stages.len() > thresholds.shallow_stage_count
        && workflow.stages.iter().all(|s| degree(workflow, &s.id) <= 1)
    {
        detections.push(OverengineeringDetection {
            id: ids.next("oe"),
            kind: OverengineeringKind::OverAbstraction,
            description: format!(
                "{} stages but almost no structure between them; the stage boundaries are abstraction without information",
                workflow.stages.len()
            ),
            affected: workflow.stages.iter().map(|s| s.id.clone()).collect(),
        });
    }

    if goal != Goal::Cost {
        for imp in optimization
            .improvements
            .iter()
            .filter(|i| i.kind == ImprovementKind::Performance)
        {
            detections.push(OverengineeringDetection {
                id: ids.next("oe"),
                kind: OverengineeringKind::PrematureOptimization,
                description: format!(
                    "Improvement '{}' optimizes performance nobody asked for under the {} goal",
                    imp.id, goal
                ),
                affected: vec![imp.id.clone()],
            });
        }
    }

    if goal != Goal::Reliability {
        let reliability: Vec<String> = optimization
            .improvements
            .iter()
            .filter(|i| i.kind == ImprovementKind::Reliability)
            .map(|i| i.id.clone())
            .collect();
        if reliability.len() > 2 {
            detections.push(OverengineeringDetection {
                id: ids.next("oe"),
                kind: OverengineeringKind::ExcessiveRedundancy,
                description: format!(
                    "{} reliability improvements under the {} goal; redundancy is displacing the stated objective",
                    reliability.len(),
                    goal
                ),
                affected: reliability,
            });
        }
    }

    detections.extend(duplicate_stages(workflow, thresholds, ids));
    detections
}

fn degree(workflow: &WorkflowGraph, id: &str) -> usize {
    let explicit = workflow
        .dependencies
        .iter()
        .filter(|d| d.from == id || d.to == id)
        .count();
    let inline = workflow
        .stages
        .iter()
        .map(|s| {
            if s.id == id {
                s.depends_on.len()
            } else {
                s.depends_on.iter().filter(|d| *d == id).count()
            }
        })
        .sum::<usize>();
    explicit + inline
}

/// Stage pairs with the same kind and near-identical configuration.
fn duplicate_stages(
    workflow: &WorkflowGraph,
    thresholds: &AnalysisThresholds,
    ids: &mut IdGen,
) -> Vec<OverengineeringDetection> {
    let mut detections = Vec::new();

    for (i, a) in workflow.stages.iter().enumerate() {
        for b in &workflow.stages[i + 1..] {
            if a.kind != b.kind || (a.config.is_empty() && b.config.is_empty()) {
                continue;
            }
            let (Ok(ser_a), Ok(ser_b)) = (
                serde_json::to_string(&a.config),
                serde_json::to_string(&b.config),
            ) else {
                continue;
            };
            let score = similarity(&ser_a, &ser_b);
            if score > thresholds.duplicate_similarity {
                detections.push(OverengineeringDetection {
                    id: ids.next("oe"),
                    kind: OverengineeringKind::ExcessiveRedundancy,
                    description: format!(
                        "Stages '{}' and '{}' share a kind and {:.0}% of their configuration; one of them is probably a copy",
                        a.id,
                        b.id,
                        score * 100.0
                    ),
                    affected: vec![a.id.clone(), b.id.clone()],
                });
            }
        }
    }

    detections
}

/// Normalized edit-distance similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single-row DP over the shorter dimension
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev + usize::from(ca != cb);
            prev = row[j + 1];
            row[j + 1] = substitute.min(prev + 1).min(row[j] + 1);
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{stage, workflow};
    use flowlens_core::{Confidence, Improvement, Priority};

    fn opt_with(improvements: Vec<Improvement>) -> OptimizationOutput {
        OptimizationOutput {
            improvements,
            missing_steps: Vec::new(),
            refined_graph: workflow(vec![stage("a")], Vec::new()),
            confidence: Confidence::clamped(0.8),
            narrative: None,
        }
    }

    fn imp(id: &str, kind: ImprovementKind, description: &str) -> Improvement {
        Improvement {
            id: id.to_string(),
            kind,
            priority: Priority::Medium,
            description: description.to_string(),
            implementation: String::new(),
            tradeoffs: Vec::new(),
            goal_alignment: 0.5,
        }
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }

    #[test]
    fn test_similarity_range() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert!(similarity("abc", "xyz") < 0.1);
        assert!(similarity("abcdefgh", "abcdefgx") > 0.8);
    }

    #[test]
    fn test_near_duplicate_stages_detected() {
        let mut a = stage("extract-eu");
        let mut b = stage("extract-us");
        a.config
            .insert("script".to_string(), serde_json::json!("extract.sh --region eu"));
        b.config
            .insert("script".to_string(), serde_json::json!("extract.sh --region us"));
        let wf = workflow(vec![a, b], Vec::new());

        let detections = detect(
            &wf,
            Goal::Simplicity,
            &opt_with(Vec::new()),
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        let dup = detections
            .iter()
            .find(|d| d.kind == OverengineeringKind::ExcessiveRedundancy)
            .unwrap();
        assert_eq!(dup.affected, vec!["extract-eu", "extract-us"]);
    }

    #[test]
    fn test_empty_configs_never_count_as_duplicates() {
        let wf = workflow(vec![stage("a"), stage("b")], Vec::new());
        let detections = detect(
            &wf,
            Goal::Simplicity,
            &opt_with(Vec::new()),
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        assert!(detections.is_empty());
    }

    #[test]
    fn test_performance_advice_flagged_off_cost_goal() {
        let opt = opt_with(vec![imp("imp-1", ImprovementKind::Performance, "cache it")]);
        let wf = workflow(vec![stage("a")], Vec::new());

        let flagged = detect(
            &wf,
            Goal::Simplicity,
            &opt,
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        assert!(flagged
            .iter()
            .any(|d| d.kind == OverengineeringKind::PrematureOptimization));

        let not_flagged = detect(
            &wf,
            Goal::Cost,
            &opt,
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        assert!(not_flagged
            .iter()
            .all(|d| d.kind != OverengineeringKind::PrematureOptimization));
    }

    #[test]
    fn test_complexity_vocabulary_flagged() {
        let opt = opt_with(vec![imp(
            "imp-1",
            ImprovementKind::Architecture,
            "Adopt a sophisticated event mesh",
        )]);
        let wf = workflow(vec![stage("a")], Vec::new());
        let detections = detect(
            &wf,
            Goal::Simplicity,
            &opt,
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        assert!(detections
            .iter()
            .any(|d| d.kind == OverengineeringKind::ComplexityKeyword));
    }

    #[test]
    fn test_shallow_wide_graph_is_over_abstraction() {
        let stages = (0..10).map(|i| stage(&format!("s{i}"))).collect();
        let wf = workflow(stages, Vec::new());
        let detections = detect(
            &wf,
            Goal::Simplicity,
            &opt_with(Vec::new()),
            &AnalysisThresholds::default(),
            &mut IdGen::new(),
        );
        assert!(detections
            .iter()
            .any(|d| d.kind == OverengineeringKind::OverAbstraction));
    }
}
