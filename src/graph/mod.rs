//! Relational knowledge graph used for path mining.
//!
//! The graph is produced by an external crawler as two files:
//!
//! - a line-oriented record store, one JSON object per line mapping a node to
//!   its neighbor edges (`{"eat": [{"name": "hungry", "relation": "RelatedTo", "weight": 1.0}]}`)
//! - a flat node → line index ([`GraphIndex`])
//!
//! [`KnowledgeGraph`] memory-maps the record store and decodes one node's
//! neighbors at a time, so a search never materializes the whole graph.
//! [`traverse`] finds relation paths between words and [`rules`] turns those
//! paths into inference rules.

pub mod index;
pub mod rules;
pub mod store;
pub mod traverse;

use serde::{Deserialize, Serialize};

pub use index::GraphIndex;
pub use store::KnowledgeGraph;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, crate::error::GraphError>;

/// One neighbor entry of a node record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The neighbor node.
    pub name: String,
    /// Relation label, e.g. `IsA` or `Antonym`.
    pub relation: String,
    /// Crawler-assigned edge weight. Path search ignores it.
    #[serde(default)]
    pub weight: f64,
}

/// A traversed edge: `from --relation--> to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge {
    pub from: String,
    pub relation: String,
    pub to: String,
}

impl PathEdge {
    pub fn new(from: impl Into<String>, relation: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            relation: relation.into(),
            to: to.into(),
        }
    }
}

impl std::fmt::Display for PathEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.relation, self.to)
    }
}

/// Canonical node key: lower case, whitespace runs and underscores joined by `_`.
///
/// The crawler keys records by underscore-joined terms but stores neighbor
/// names with spaces; both sides are compared in this form.
pub fn node_key(word: &str) -> String {
    word.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_keys_unify_spaces_and_underscores() {
        assert_eq!(node_key("Go Fast"), "go_fast");
        assert_eq!(node_key("go_fast"), "go_fast");
        assert_eq!(node_key("  eat "), "eat");
    }

    #[test]
    fn edge_weight_defaults() {
        let e: Edge = serde_json::from_str(r#"{"name":"cat","relation":"IsA"}"#).unwrap();
        assert_eq!(e.weight, 0.0);
    }
}
