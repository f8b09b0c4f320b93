//! Direct translation: every training example becomes one rule.
//!
//! The example's predicates are variablized into the rule body and the head
//! states that the pronoun corefers with the correct candidate:
//!
//! ```text
//! coref(V2, V0) :- event_subject(eat, V0), event_object(eat, V1), property(hungry, V2).
//! ```
//!
//! The test sentence's predicates follow as ground facts.

use std::collections::HashMap;

use crate::error::BuildError;
use crate::predicate::Predicate;
use crate::problem::{resolve_candidate, WscProblem};

use super::{ground_facts, BuildResult, DebugSink, ProgramBuilder, TrainingExample};

/// Builds a definite program with one rule per usable training example.
#[derive(Debug, Clone)]
pub struct DirectTranslationBuilder {
    pronoun: String,
    debug: DebugSink,
}

impl DirectTranslationBuilder {
    pub fn new(pronoun: impl Into<String>) -> Self {
        Self {
            pronoun: pronoun.into(),
            debug: DebugSink::disabled(),
        }
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    /// Translate one example into `coref(P, C) :- body.`
    ///
    /// Fails with [`BuildError::Construction`] when the pronoun or the
    /// correct candidate is not an argument of any predicate.
    pub fn example_rule(&self, example: &TrainingExample) -> BuildResult<String> {
        let var_map = variable_map(&example.predicates);
        let construction = |reason: String| BuildError::Construction {
            sentence: example.problem.sentence().to_string(),
            reason,
        };

        let pronoun_var = var_map
            .get(&self.pronoun)
            .ok_or_else(|| construction(format!("pronoun \"{}\" is unbound", self.pronoun)))?;

        let correct = example.problem.correct_candidate();
        let args = example
            .predicates
            .iter()
            .flat_map(|p| p.relevant_args().into_iter().map(|(_, arg)| arg));
        let candidate_var = resolve_candidate(correct, args)
            .and_then(|arg| var_map.get(arg))
            .ok_or_else(|| construction(format!("candidate \"{correct}\" is unbound")))?;

        let body = example
            .predicates
            .iter()
            .map(|p| p.ungrounded(&var_map))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!(
            "coref({pronoun_var}, {candidate_var}) :- {}.",
            body.join(", ")
        ))
    }
}

impl ProgramBuilder for DirectTranslationBuilder {
    fn build(
        &self,
        examples: &[TrainingExample],
        _test: &WscProblem,
        test_predicates: &[Predicate],
    ) -> BuildResult<String> {
        let mut lines = Vec::with_capacity(examples.len() + test_predicates.len());
        for example in examples {
            match self.example_rule(example) {
                Ok(rule) => lines.push(rule),
                Err(err @ BuildError::Construction { .. }) => {
                    tracing::warn!(error = %err, "skipping training example");
                }
                Err(err) => return Err(err),
            }
        }
        let rules = lines.len();
        lines.extend(ground_facts(test_predicates));

        tracing::debug!(
            examples = examples.len(),
            rules,
            facts = test_predicates.len(),
            "built direct translation program"
        );

        let program = lines.join("\n");
        self.debug.write("direct-translation.lp", &program)?;
        Ok(program)
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Fresh variable per distinct relevant argument, numbered in first-appearance order.
fn variable_map(predicates: &[Predicate]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for predicate in predicates {
        for (_, arg) in predicate.relevant_args() {
            if !map.contains_key(arg) {
                let var = format!("V{}", map.len());
                map.insert(arg.to_string(), var);
            }
        }
    }
    map
}
