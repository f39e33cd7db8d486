//! Goal-alignment weight matrix
//!
//! Fixed weights in [0.4, 1.0]; the diagonal (improvement kind matching the
//! goal's own concern) is always 1.0. Unlisted combinations fall back to a
//! neutral 0.5.

use flowlens_core::{Goal, ImprovementKind};

const WEIGHTS: &[(Goal, ImprovementKind, f64)] = &[
    (Goal::Reliability, ImprovementKind::Architecture, 0.7),
    (Goal::Reliability, ImprovementKind::Performance, 0.5),
    (Goal::Reliability, ImprovementKind::Reliability, 1.0),
    (Goal::Reliability, ImprovementKind::Cost, 0.4),
    (Goal::Reliability, ImprovementKind::Maintainability, 0.6),
    (Goal::Cost, ImprovementKind::Architecture, 0.6),
    (Goal::Cost, ImprovementKind::Performance, 0.7),
    (Goal::Cost, ImprovementKind::Reliability, 0.5),
    (Goal::Cost, ImprovementKind::Cost, 1.0),
    (Goal::Cost, ImprovementKind::Maintainability, 0.5),
    (Goal::Simplicity, ImprovementKind::Architecture, 0.8),
    (Goal::Simplicity, ImprovementKind::Performance, 0.4),
    (Goal::Simplicity, ImprovementKind::Reliability, 0.5),
    (Goal::Simplicity, ImprovementKind::Cost, 0.5),
    (Goal::Simplicity, ImprovementKind::Maintainability, 1.0),
];

pub fn goal_alignment(goal: Goal, kind: ImprovementKind) -> f64 {
    WEIGHTS
        .iter()
        .find(|(g, k, _)| *g == goal && *k == kind)
        .map(|(_, _, w)| *w)
        .unwrap_or(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_is_full_alignment() {
        assert_eq!(goal_alignment(Goal::Reliability, ImprovementKind::Reliability), 1.0);
        assert_eq!(goal_alignment(Goal::Cost, ImprovementKind::Cost), 1.0);
        assert_eq!(
            goal_alignment(Goal::Simplicity, ImprovementKind::Maintainability),
            1.0
        );
    }

    #[test]
    fn test_all_weights_in_declared_range() {
        for goal in Goal::ALL {
            for kind in ImprovementKind::ALL {
                let w = goal_alignment(goal, kind);
                assert!((0.4..=1.0).contains(&w), "{goal} / {kind:?} -> {w}");
            }
        }
    }
}
