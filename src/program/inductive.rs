//! Inductive learning task construction.
//!
//! Training examples become a learning task made of four sections:
//!
//! 1. the fixed coreference background ([`super::background_rules`])
//! 2. a head bias allowing `coref(pronoun, entity)`
//! 3. one body bias per variablized predicate signature, bounded by the
//!    largest number of times that signature occurs in a single example
//! 4. a positive and a negative example per training problem, each with its
//!    ground facts and type facts as context
//!
//! The task is handed to an [`InductiveLearner`]. Whatever it learns is
//! appended to the background and the test facts.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::BuildError;
use crate::predicate::Predicate;
use crate::problem::{candidate_atom, resolve_candidate, WscProblem};
use crate::solver::learner::InductiveLearner;

use super::{
    background_rules, ground_facts, BuildResult, DebugSink, ProgramBuilder, TrainingExample,
};

/// Builds a learning task, runs the learner and assembles the final program.
pub struct InductiveBuilder {
    pronoun: String,
    learner: Arc<dyn InductiveLearner>,
    debug: DebugSink,
}

/// The three textual sections of a learning task, before assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearningTask {
    pub background: Vec<String>,
    pub mode_bias: Vec<String>,
    pub examples: Vec<String>,
}

impl LearningTask {
    /// The task file contents.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in [&self.background, &self.mode_bias, &self.examples] {
            for line in section {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

impl InductiveBuilder {
    pub fn new(pronoun: impl Into<String>, learner: Arc<dyn InductiveLearner>) -> Self {
        Self {
            pronoun: pronoun.into(),
            learner,
            debug: DebugSink::disabled(),
        }
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    /// Build the learning task for `examples` without running the learner.
    pub fn task(&self, examples: &[TrainingExample]) -> LearningTask {
        let mut head_bias = BTreeSet::new();
        let mut body_bias: BTreeMap<String, usize> = BTreeMap::new();
        let mut lines = Vec::new();

        for (i, example) in examples.iter().enumerate() {
            let placeholders = placeholder_map(&example.predicates);

            let mut counts: HashMap<String, usize> = HashMap::new();
            for predicate in &example.predicates {
                // Placeholders cover every relevant argument, so this cannot fail.
                let Ok(signature) = predicate.ungrounded(&placeholders) else {
                    continue;
                };
                *counts.entry(signature).or_default() += 1;

                if predicate.args().iter().any(|a| *a == self.pronoun) {
                    head_bias.insert(format!(
                        "#modeh(coref({}, var(entity))).",
                        self.pronoun
                    ));
                }
            }
            for (signature, count) in counts {
                let max = body_bias.entry(signature).or_default();
                *max = (*max).max(count);
            }

            match self.example_pair(i, example) {
                Some((pos, neg)) => {
                    lines.push(pos);
                    lines.push(neg);
                }
                None => tracing::warn!(
                    sentence = example.problem.sentence(),
                    "correct candidate not found among example arguments, skipping examples"
                ),
            }
        }

        let mut mode_bias: Vec<String> = head_bias.into_iter().collect();
        mode_bias.extend(
            body_bias
                .into_iter()
                .map(|(signature, max)| format!("#modeb({max}, {signature}, (anti_reflexive)).")),
        );

        LearningTask {
            background: background_rules(&self.pronoun),
            mode_bias,
            examples: lines,
        }
    }

    /// `#pos`/`#neg` pair for one example, or `None` if the correct
    /// candidate is not an argument.
    fn example_pair(&self, i: usize, example: &TrainingExample) -> Option<(String, String)> {
        let args: Vec<&str> = example
            .predicates
            .iter()
            .flat_map(|p| p.relevant_args().into_iter().map(|(_, arg)| arg))
            .collect();
        let correct = resolve_candidate(example.problem.correct_candidate(), args.iter().copied())?;
        let incorrect = resolve_candidate(example.problem.incorrect_candidate(), args.iter().copied())
            .map(str::to_string)
            .unwrap_or_else(|| candidate_atom(example.problem.incorrect_candidate()));

        let context = context(&example.predicates);
        let pos = format!(
            "#pos(p{i}, {{coref({}, {correct})}}, {{}}, {{{context}}}).",
            self.pronoun
        );
        let neg = format!(
            "#neg(n{i}, {{coref({}, {incorrect})}}, {{}}, {{{context}}}).",
            self.pronoun
        );
        Some((pos, neg))
    }
}

impl ProgramBuilder for InductiveBuilder {
    fn build(
        &self,
        examples: &[TrainingExample],
        _test: &WscProblem,
        test_predicates: &[Predicate],
    ) -> BuildResult<String> {
        let task = self.task(examples).render();
        self.debug.write("inductive-task.las", &task)?;

        let learned = self.learner.learn(&task)?;
        tracing::info!(
            examples = examples.len(),
            learned_rules = learned.lines().filter(|l| !l.trim().is_empty()).count(),
            "inductive learning finished"
        );
        self.debug.write("inductive-learned.lp", &learned)?;

        let mut lines = background_rules(&self.pronoun);
        lines.extend(ground_facts(test_predicates));
        let learned = learned.trim();
        if !learned.is_empty() {
            lines.push(learned.to_string());
        }
        Ok(lines.join("\n"))
    }

    fn name(&self) -> &'static str {
        "inductive"
    }
}

/// Every relevant argument mapped to its typed placeholder, e.g. `var(entity)`.
fn placeholder_map(predicates: &[Predicate]) -> HashMap<String, String> {
    predicates
        .iter()
        .flat_map(Predicate::relevant_args)
        .map(|(kind, arg)| (arg.to_string(), format!("var({})", kind.type_name())))
        .collect()
}

/// Ground facts followed by one type fact per distinct argument.
fn context(predicates: &[Predicate]) -> String {
    let mut parts = ground_facts(predicates);
    let mut seen = BTreeSet::new();
    for (kind, arg) in predicates.iter().flat_map(Predicate::relevant_args) {
        if seen.insert((kind.type_name(), arg)) {
            parts.push(format!("{}({arg}).", kind.type_name()));
        }
    }
    parts.join(" ")
}
