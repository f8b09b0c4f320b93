//! Background rules mined from knowledge-graph paths.
//!
//! Words that co-occur with a candidate in some test predicate form the start
//! set; words that co-occur with the pronoun form the end set. Every
//! start/end pair is searched in the graph and each path found is turned into
//! rules. The searches are independent and run on the rayon pool.

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;

use crate::graph::rules::{path_to_rules, WordClassifier};
use crate::graph::traverse::{search, SearchStrategy};
use crate::graph::KnowledgeGraph;
use crate::predicate::Predicate;
use crate::problem::{mentions, Answer, WscProblem};

use super::{background_rules, ground_facts, BuildResult, DebugSink, ProgramBuilder, TrainingExample};

/// Builds a program from graph-mined rules, the coreference background and
/// the test facts. Training examples are not used.
pub struct PathMinedBuilder {
    pronoun: String,
    graph: Arc<KnowledgeGraph>,
    classifier: Arc<dyn WordClassifier>,
    strategy: SearchStrategy,
    debug: DebugSink,
}

impl PathMinedBuilder {
    pub fn new(
        pronoun: impl Into<String>,
        graph: Arc<KnowledgeGraph>,
        classifier: Arc<dyn WordClassifier>,
    ) -> Self {
        Self {
            pronoun: pronoun.into(),
            graph,
            classifier,
            strategy: SearchStrategy::default(),
            debug: DebugSink::disabled(),
        }
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    /// Words linked to either candidate, and words linked to the pronoun.
    pub fn endpoints<'a>(
        &self,
        test: &WscProblem,
        predicates: &'a [Predicate],
    ) -> (BTreeSet<&'a str>, BTreeSet<&'a str>) {
        let c1 = test.candidate(Answer::First);
        let c2 = test.candidate(Answer::Second);
        let is_referent =
            |w: &str| w == self.pronoun || mentions(c1, w) || mentions(c2, w);

        let starts = linked_words(predicates, |w| mentions(c1, w) || mentions(c2, w), is_referent);
        let ends = linked_words(predicates, |w| w == self.pronoun, is_referent);
        (starts, ends)
    }

    /// Rules induced by all paths between the endpoint sets.
    pub fn mine_rules(
        &self,
        starts: &BTreeSet<&str>,
        ends: &BTreeSet<&str>,
    ) -> BuildResult<BTreeSet<String>> {
        let pairs: Vec<(&str, &str)> = starts
            .iter()
            .flat_map(|s| ends.iter().map(move |e| (*s, *e)))
            .filter(|(s, e)| s != e)
            .collect();

        let per_pair = pairs
            .par_iter()
            .map(|(start, end)| -> BuildResult<BTreeSet<String>> {
                let path = search(&self.graph, start, end, self.strategy)?;
                Ok(match path {
                    Some(path) => {
                        tracing::debug!(start, end, edges = path.len(), "found path");
                        path_to_rules(&path, self.classifier.as_ref())
                    }
                    None => BTreeSet::new(),
                })
            })
            .collect::<BuildResult<Vec<BTreeSet<String>>>>()?;

        let rules: BTreeSet<String> = per_pair.into_iter().flatten().collect();
        tracing::info!(pairs = pairs.len(), rules = rules.len(), "mined graph rules");
        Ok(rules)
    }
}

impl ProgramBuilder for PathMinedBuilder {
    fn build(
        &self,
        _examples: &[TrainingExample],
        test: &WscProblem,
        test_predicates: &[Predicate],
    ) -> BuildResult<String> {
        let (starts, ends) = self.endpoints(test, test_predicates);
        let rules = self.mine_rules(&starts, &ends)?;

        let mut lines: Vec<String> = rules.into_iter().collect();
        lines.extend(background_rules(&self.pronoun));
        lines.extend(ground_facts(test_predicates));

        let program = lines.join("\n");
        self.debug.write("path-mined.lp", &program)?;
        Ok(program)
    }

    fn name(&self) -> &'static str {
        "path-mined"
    }

    fn uses_examples(&self) -> bool {
        false
    }
}

/// Words of every predicate that contains an `anchor` word, minus the
/// referents themselves.
fn linked_words<'a>(
    predicates: &'a [Predicate],
    anchor: impl Fn(&str) -> bool,
    exclude: impl Fn(&str) -> bool,
) -> BTreeSet<&'a str> {
    predicates
        .iter()
        .map(Predicate::all_args)
        .filter(|words| words.iter().any(|w| anchor(w)))
        .flatten()
        .filter(|w| !exclude(w))
        .collect()
}
