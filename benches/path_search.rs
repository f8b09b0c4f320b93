//! Benchmarks for knowledge-graph path search and retrieval.

use std::fmt::Write as _;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wsc_asp::graph::rules::{path_to_rules, WordClass, WordClassifier};
use wsc_asp::graph::traverse::{find_path, find_path_bounded};
use wsc_asp::graph::{GraphIndex, KnowledgeGraph};
use wsc_asp::retrieve::{SimilarityRetriever, TfIdfRetriever};

const NODES: usize = 5_000;
const RELATIONS: [&str; 4] = ["IsA", "RelatedTo", "Antonym", "HasProperty"];

/// Deterministic sparse graph: node `i` links to `i + 1`, `2i` and `3i + 7`.
fn build_graph(dir: &tempfile::TempDir) -> KnowledgeGraph {
    let mut records = String::new();
    for i in 0..NODES {
        let targets = [(i + 1) % NODES, (2 * i) % NODES, (3 * i + 7) % NODES];
        let edges: Vec<String> = targets
            .iter()
            .enumerate()
            .map(|(k, t)| {
                format!(
                    r#"{{"name": "w{t}", "relation": "{}", "weight": 1.0}}"#,
                    RELATIONS[(i + k) % RELATIONS.len()]
                )
            })
            .collect();
        writeln!(records, r#"{{"w{i}": [{}]}}"#, edges.join(", ")).unwrap();
    }
    let path = dir.path().join("records.jsonl");
    std::fs::write(&path, records).unwrap();
    let index = GraphIndex::build(&path).unwrap();
    KnowledgeGraph::with_index(&path, &index).unwrap()
}

struct EveryOtherAdjective;

impl WordClassifier for EveryOtherAdjective {
    fn classify(&self, word: &str) -> WordClass {
        if word.len() % 2 == 0 {
            WordClass::Adjective
        } else {
            WordClass::Verb
        }
    }
}

fn bench_bfs(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let graph = build_graph(&dir);

    c.bench_function("bfs_5k_far", |bench| {
        bench.iter(|| black_box(find_path(&graph, "w1", "w4999").unwrap()))
    });
    c.bench_function("bfs_5k_unreachable", |bench| {
        bench.iter(|| black_box(find_path(&graph, "w1", "missing").unwrap()))
    });
}

fn bench_dfs(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let graph = build_graph(&dir);

    c.bench_function("dfs_5k_depth6", |bench| {
        bench.iter(|| black_box(find_path_bounded(&graph, "w1", "w4999", 6).unwrap()))
    });
}

fn bench_rules(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let graph = build_graph(&dir);
    let path = find_path(&graph, "w1", "w4999").unwrap().unwrap_or_default();

    c.bench_function("path_to_rules", |bench| {
        bench.iter(|| black_box(path_to_rules(&path, &EveryOtherAdjective)))
    });
}

fn bench_retrieval(c: &mut Criterion) {
    let subjects = ["cat", "dog", "man", "trophy", "city", "council"];
    let verbs = ["ate", "chased", "lifted", "refused", "feared", "fit"];
    let corpus: Vec<String> = (0..1_000)
        .map(|i| {
            format!(
                "The {} {} the {} because _ was {}.",
                subjects[i % subjects.len()],
                verbs[(i / 6) % verbs.len()],
                subjects[(i / 36) % subjects.len()],
                ["hungry", "weak", "large", "afraid"][i % 4]
            )
        })
        .collect();
    let retriever = TfIdfRetriever::new(&corpus);

    c.bench_function("tfidf_nearest_1k", |bench| {
        bench.iter(|| black_box(retriever.nearest("The fox ate the hen because _ was hungry.", 5)))
    });
}

criterion_group!(benches, bench_bfs, bench_dfs, bench_rules, bench_retrieval);
criterion_main!(benches);
