//! Shared builders for analysis-stage tests

use std::collections::BTreeMap;

use flowlens_core::{
    Dependency, DependencyKind, GraphMetadata, Stage, StageKind, WorkflowGraph,
};

pub fn stage(id: &str) -> Stage {
    Stage {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        kind: StageKind::Task,
        config: BTreeMap::new(),
        depends_on: Vec::new(),
        resources: Vec::new(),
        retry_policy: None,
    }
}

pub fn named_stage(id: &str, name: &str, description: &str) -> Stage {
    let mut s = stage(id);
    s.name = name.to_string();
    s.description = description.to_string();
    s
}

pub fn dep(from: &str, to: &str) -> Dependency {
    Dependency {
        from: from.to_string(),
        to: to.to_string(),
        kind: DependencyKind::Sequential,
        condition: None,
    }
}

pub fn dep_kind(from: &str, to: &str, kind: DependencyKind) -> Dependency {
    Dependency {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        condition: None,
    }
}

pub fn workflow(stages: Vec<Stage>, dependencies: Vec<Dependency>) -> WorkflowGraph {
    WorkflowGraph {
        stages,
        dependencies,
        triggers: Vec::new(),
        resources: Vec::new(),
        metadata: GraphMetadata::default(),
    }
}

/// A linear chain a -> b -> c -> ... of `len` stages
pub fn chain_workflow(len: usize) -> WorkflowGraph {
    let ids: Vec<String> = (0..len).map(|i| format!("s{i}")).collect();
    let stages = ids.iter().map(|id| stage(id)).collect();
    let dependencies = ids
        .windows(2)
        .map(|pair| dep(&pair[0], &pair[1]))
        .collect();
    workflow(stages, dependencies)
}

/// One hub stage fanning out to `n` dependents
pub fn fan_out_workflow(n: usize) -> WorkflowGraph {
    let mut stages = vec![stage("hub")];
    let mut dependencies = Vec::new();
    for i in 0..n {
        let id = format!("leaf{i}");
        stages.push(stage(&id));
        dependencies.push(dep("hub", &id));
    }
    workflow(stages, dependencies)
}
