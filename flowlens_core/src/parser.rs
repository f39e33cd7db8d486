//! Parser collaborator seam
//!
//! The engine consumes a validated [`WorkflowGraph`] or a structured parse
//! failure; everything about format detection and normalization belongs to
//! the collaborator behind [`WorkflowParser`]. A serde-based reference
//! implementation is shipped for JSON and YAML documents.

use async_trait::async_trait;

use crate::error::ParseError;
use crate::model::WorkflowGraph;

/// Turns raw workflow text into a validated graph.
#[async_trait]
pub trait WorkflowParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<WorkflowGraph, ParseError>;
}

/// Reference parser: JSON if the document opens with `{`, YAML otherwise.
///
/// Both branches run the graph validation pass, so the pipeline never sees a
/// graph with duplicate stage ids or dangling dependency endpoints.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_document(text: &str) -> Result<WorkflowGraph, ParseError> {
        let trimmed = text.trim_start();
        let graph: WorkflowGraph = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed)
                .map_err(|e| ParseError::MalformedJson(e.to_string()))?
        } else {
            serde_yaml::from_str(trimmed)
                .map_err(|e| ParseError::MalformedYaml(e.to_string()))?
        };
        graph.validate().map_err(ParseError::InvalidGraph)?;
        Ok(graph)
    }
}

#[async_trait]
impl WorkflowParser for DocumentParser {
    async fn parse(&self, text: &str) -> Result<WorkflowGraph, ParseError> {
        Self::parse_document(text)
    }
}
