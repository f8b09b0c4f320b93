//! Node → line index over the record store.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::error::GraphError;

use super::{node_key, GraphResult};

/// Maps each node to the zero-based line of its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphIndex {
    lines: HashMap<String, usize>,
}

impl GraphIndex {
    /// Scan a record store and index the key of every line.
    ///
    /// A node recorded twice resolves to its last record.
    pub fn build(records: &Path) -> GraphResult<Self> {
        let file = std::fs::File::open(records).map_err(|source| GraphError::Io {
            path: records.to_path_buf(),
            source,
        })?;

        let mut lines = HashMap::new();
        for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| GraphError::Io {
                path: records.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let record: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&line)
                .map_err(|e| GraphError::Record {
                    line: line_no + 1,
                    message: e.to_string(),
                })?;
            let node = record.keys().next().ok_or_else(|| GraphError::Record {
                line: line_no + 1,
                message: "record has no node key".into(),
            })?;
            lines.insert(node.clone(), line_no);
        }

        tracing::info!(nodes = lines.len(), path = %records.display(), "built node index");
        Ok(Self { lines })
    }

    /// Load a flat JSON `{node: line}` index.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lines: HashMap<String, usize> =
            serde_json::from_str(&content).map_err(|e| GraphError::Index {
                message: e.to_string(),
            })?;
        Ok(Self { lines })
    }

    /// Write the index as a flat JSON object.
    pub fn save(&self, path: &Path) -> GraphResult<()> {
        let json = serde_json::to_string(&self.lines).map_err(|e| GraphError::Index {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Index keyed by canonical node key, for lookups from predicate words.
    ///
    /// Raw keys that share a canonical key (`go fast`, `go_fast`) resolve to
    /// the later line, matching the last-record rule of [`GraphIndex::build`].
    pub(crate) fn canonical(&self) -> HashMap<String, usize> {
        let mut canonical: HashMap<String, usize> = HashMap::with_capacity(self.lines.len());
        for (node, &line) in &self.lines {
            let entry = canonical.entry(node_key(node)).or_insert(line);
            *entry = (*entry).max(line);
        }
        canonical
    }

    pub fn get(&self, node: &str) -> Option<usize> {
        self.lines.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
