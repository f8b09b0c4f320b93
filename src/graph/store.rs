//! Memory-mapped, read-only view of the record store.
//!
//! Line boundaries are computed once at open. A neighbor lookup is then one
//! hash lookup and one JSON decode of a single line, without reading the rest
//! of the file.

use std::collections::HashMap;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::GraphError;

use super::{node_key, Edge, GraphIndex, GraphResult};

/// Read-only knowledge graph over a crawler record store.
pub struct KnowledgeGraph {
    path: PathBuf,
    /// `None` for an empty store (zero-length files cannot be mapped).
    mmap: Option<Mmap>,
    /// Byte range of each line, newline excluded.
    lines: Vec<Range<usize>>,
    /// Canonical node key → line number.
    index: HashMap<String, usize>,
}

impl KnowledgeGraph {
    /// Open a record store with its on-disk index file.
    pub fn open(records: &Path, index: &Path) -> GraphResult<Self> {
        let index = GraphIndex::load(index)?;
        Self::with_index(records, &index)
    }

    /// Open a record store with an index already in memory.
    pub fn with_index(records: &Path, index: &GraphIndex) -> GraphResult<Self> {
        let io_err = |source| GraphError::Io {
            path: records.to_path_buf(),
            source,
        };
        let file = File::open(records).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();

        // Safety: the store is append-only and written by a separate crawler
        // run; it is not modified while a resolver process has it mapped.
        let mmap = if len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file) }.map_err(io_err)?)
        };

        let lines = mmap.as_deref().map(line_ranges).unwrap_or_default();

        tracing::debug!(
            path = %records.display(),
            lines = lines.len(),
            nodes = index.len(),
            "opened knowledge graph"
        );

        Ok(Self {
            path: records.to_path_buf(),
            mmap,
            lines,
            index: index.canonical(),
        })
    }

    /// Whether the index knows `word`.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(&node_key(word))
    }

    /// Neighbor edges of `word` in stored order, or `None` if the node is not indexed.
    pub fn neighbors(&self, word: &str) -> GraphResult<Option<Vec<Edge>>> {
        let key = node_key(word);
        let Some(&line) = self.index.get(&key) else {
            return Ok(None);
        };
        let stale = || GraphError::StaleIndex {
            node: key.clone(),
            line,
        };

        let range = self.lines.get(line).ok_or_else(stale)?.clone();
        let bytes = match &self.mmap {
            Some(mmap) => &mmap[range],
            None => return Err(stale()),
        };

        let record: HashMap<String, Vec<Edge>> =
            serde_json::from_slice(bytes).map_err(|e| GraphError::Record {
                line: line + 1,
                message: e.to_string(),
            })?;
        record
            .into_iter()
            .find(|(node, _)| node_key(node) == key)
            .map(|(_, edges)| Some(edges))
            .ok_or_else(stale)
    }

    /// Number of indexed nodes.
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Path to the backing record store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for KnowledgeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraph")
            .field("path", &self.path)
            .field("lines", &self.lines.len())
            .field("nodes", &self.index.len())
            .finish()
    }
}

/// Byte ranges of every line, including a final unterminated one.
fn line_ranges(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            let end = if i > start && bytes[i - 1] == b'\r' { i - 1 } else { i };
            ranges.push(start..end);
            start = i + 1;
        }
    }
    if start < bytes.len() {
        ranges.push(start..bytes.len());
    }
    ranges
}
