//! Resource contention grouping
//!
//! Stages are grouped by the resource ids they declare. A group is
//! "concurrent" when no two of its stages are ordered by any dependency
//! chain; only concurrent groups with more than two members are reported,
//! since two unordered users of one resource rarely contend in practice.

use serde::{Deserialize, Serialize};

use super::StageGraph;

/// A set of unordered stages competing for one resource
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentionGroup {
    pub resource_id: String,
    pub stages: Vec<String>,
}

impl StageGraph {
    /// Report resources whose users can all run concurrently.
    pub fn resource_contention_groups(&self) -> Vec<ContentionGroup> {
        let mut groups = Vec::new();

        for (resource_id, users) in &self.resource_users {
            if users.len() <= 2 {
                continue;
            }
            let concurrent = users.iter().enumerate().all(|(i, a)| {
                users[i + 1..]
                    .iter()
                    .all(|b| !self.in_dependency_chain(a, b))
            });
            if concurrent {
                groups.push(ContentionGroup {
                    resource_id: resource_id.clone(),
                    stages: users.clone(),
                });
            }
        }

        groups
    }
}
