//! Path search between two words of the knowledge graph.
//!
//! Breadth-first search is the default: the first time the goal appears as a
//! neighbor the path is returned, so it is shortest by edge count (weights are
//! ignored). Shorter paths induce fewer spurious rules. A depth-bounded
//! depth-first variant is available for bounded exploration.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{node_key, GraphResult, KnowledgeGraph, PathEdge};

/// How [`search`] explores the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Shortest path by edge count.
    #[default]
    Bfs,
    /// First path found within `max_depth` edges.
    Dfs { max_depth: usize },
}

/// Find a path from `start` to `goal` with the given strategy.
pub fn search(
    graph: &KnowledgeGraph,
    start: &str,
    goal: &str,
    strategy: SearchStrategy,
) -> GraphResult<Option<Vec<PathEdge>>> {
    match strategy {
        SearchStrategy::Bfs => find_path(graph, start, goal),
        SearchStrategy::Dfs { max_depth } => find_path_bounded(graph, start, goal, max_depth),
    }
}

/// Reject searches that cannot produce a path.
fn trivially_none(graph: &KnowledgeGraph, start: &str, goal: &str) -> bool {
    start == goal || (!graph.contains(start) && !graph.contains(goal))
}

/// Shortest edge path from `start` to `goal`, or `None` if unreachable.
///
/// Each node is expanded at most once; neighbors are fetched from the store
/// only when their node is dequeued.
pub fn find_path(
    graph: &KnowledgeGraph,
    start: &str,
    goal: &str,
) -> GraphResult<Option<Vec<PathEdge>>> {
    let start = node_key(start);
    let goal = node_key(goal);
    if trivially_none(graph, &start, &goal) {
        return Ok(None);
    }

    // Predecessor edge of every discovered node; the start has none.
    let mut parent: HashMap<String, PathEdge> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::from([start.clone()]);
    let mut queue: VecDeque<String> = VecDeque::from([start.clone()]);

    while let Some(node) = queue.pop_front() {
        let Some(edges) = graph.neighbors(&node)? else {
            continue;
        };
        for edge in edges {
            let next = node_key(&edge.name);
            if !visited.insert(next.clone()) {
                continue;
            }
            parent.insert(next.clone(), PathEdge::new(&node, edge.relation, &next));
            if next == goal {
                return Ok(Some(unwind(&parent, &start, &goal)));
            }
            queue.push_back(next);
        }
    }
    Ok(None)
}

/// Follow predecessor edges back from `goal` to `start`.
fn unwind(parent: &HashMap<String, PathEdge>, start: &str, goal: &str) -> Vec<PathEdge> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(edge) = parent.get(current) else {
            break;
        };
        path.push(edge.clone());
        current = &edge.from;
    }
    path.reverse();
    path
}

/// Depth-first search limited to `max_depth` edges.
///
/// The returned path is not necessarily the shortest. Nodes on the current
/// path are never revisited, which bounds the search on cyclic graphs.
pub fn find_path_bounded(
    graph: &KnowledgeGraph,
    start: &str,
    goal: &str,
    max_depth: usize,
) -> GraphResult<Option<Vec<PathEdge>>> {
    let start = node_key(start);
    let goal = node_key(goal);
    if trivially_none(graph, &start, &goal) || max_depth == 0 {
        return Ok(None);
    }

    let mut path = Vec::new();
    let mut on_path = HashSet::from([start.clone()]);
    if dfs(graph, &start, &goal, max_depth, &mut path, &mut on_path)? {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

fn dfs(
    graph: &KnowledgeGraph,
    node: &str,
    goal: &str,
    remaining: usize,
    path: &mut Vec<PathEdge>,
    on_path: &mut HashSet<String>,
) -> GraphResult<bool> {
    if remaining == 0 {
        return Ok(false);
    }
    let Some(edges) = graph.neighbors(node)? else {
        return Ok(false);
    };
    for edge in edges {
        let next = node_key(&edge.name);
        if on_path.contains(&next) {
            continue;
        }
        path.push(PathEdge::new(node, edge.relation, &next));
        if next == goal {
            return Ok(true);
        }
        on_path.insert(next.clone());
        if dfs(graph, &next, goal, remaining - 1, path, on_path)? {
            return Ok(true);
        }
        on_path.remove(&next);
        path.pop();
    }
    Ok(false)
}
