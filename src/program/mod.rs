//! Program builders: strategies that turn predicates into solver input.
//!
//! All strategies implement [`ProgramBuilder`] and are selected at runtime by
//! [`Strategy`]:
//!
//! - [`DirectTranslationBuilder`]: one rule per training example
//! - [`InductiveBuilder`]: an inductive learning task, solved by an external learner
//! - [`PathMinedBuilder`]: rules mined from knowledge-graph paths

pub mod direct;
pub mod inductive;
pub mod path_mined;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::predicate::Predicate;
use crate::problem::WscProblem;

pub use direct::DirectTranslationBuilder;
pub use inductive::InductiveBuilder;
pub use path_mined::PathMinedBuilder;

/// Result type for builder operations.
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// A retrieved training problem with its extracted predicates.
#[derive(Debug, Clone)]
pub struct TrainingExample {
    pub problem: WscProblem,
    pub predicates: Vec<Predicate>,
}

impl TrainingExample {
    pub fn new(problem: WscProblem, predicates: Vec<Predicate>) -> Self {
        Self {
            problem,
            predicates,
        }
    }
}

/// A strategy for producing a complete answer-set program.
pub trait ProgramBuilder: Send + Sync {
    /// Build the program for `test` from the retrieved examples and the
    /// test sentence's predicates.
    fn build(
        &self,
        examples: &[TrainingExample],
        test: &WscProblem,
        test_predicates: &[Predicate],
    ) -> BuildResult<String>;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether the program depends on retrieved training examples.
    fn uses_examples(&self) -> bool {
        true
    }
}

/// Which builder the resolver uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Direct,
    Inductive,
    PathMined,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "direct-translation" => Ok(Strategy::Direct),
            "inductive" | "ilasp" => Ok(Strategy::Inductive),
            "path-mined" | "path" | "conceptnet" => Ok(Strategy::PathMined),
            other => Err(format!(
                "unknown strategy \"{other}\" (expected direct, inductive or path-mined)"
            )),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::Direct => "direct",
            Strategy::Inductive => "inductive",
            Strategy::PathMined => "path-mined",
        })
    }
}

/// The fixed coreference background shared by the inductive and path-mined
/// builders: the pronoun corefers with any `Y` that shares a property or an
/// event role with it.
pub fn background_rules(pronoun: &str) -> Vec<String> {
    ["property", "event_subject", "event_object"]
        .iter()
        .map(|functor| {
            format!(
                "coref({pronoun}, Y) :- {functor}(X, {pronoun}), {functor}(X, Y), Y != {pronoun}."
            )
        })
        .collect()
}

/// Ground facts of the test predicates, one per line.
pub fn ground_facts(predicates: &[Predicate]) -> Vec<String> {
    predicates.iter().map(Predicate::grounded).collect()
}

/// Optional destination for intermediate programs.
#[derive(Debug, Clone, Default)]
pub struct DebugSink {
    dir: Option<PathBuf>,
}

impl DebugSink {
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write `content` to `name` inside the debug directory, if enabled.
    pub fn write(&self, name: &str, content: &str) -> BuildResult<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(name);
        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, content))
            .map_err(|source| BuildError::DebugWrite { path, source })?;
        tracing::debug!(path = %dir.join(name).display(), "wrote debug program");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_has_three_rules_guarding_reflexivity() {
        let rules = background_rules("target_pronoun");
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules[0],
            "coref(target_pronoun, Y) :- property(X, target_pronoun), property(X, Y), Y != target_pronoun."
        );
        assert!(rules[1].contains("event_subject(X, target_pronoun)"));
        assert!(rules[2].contains("event_object(X, Y)"));
    }

    #[test]
    fn strategy_parses_aliases() {
        assert_eq!("direct".parse::<Strategy>().unwrap(), Strategy::Direct);
        assert_eq!("ILASP".parse::<Strategy>().unwrap(), Strategy::Inductive);
        assert_eq!("path-mined".parse::<Strategy>().unwrap(), Strategy::PathMined);
        assert!("magic".parse::<Strategy>().is_err());
        assert_eq!(Strategy::PathMined.to_string(), "path-mined");
    }

    #[test]
    fn disabled_sink_writes_nothing() {
        DebugSink::disabled().write("x.lp", "a.").unwrap();
    }

    #[test]
    fn sink_creates_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let sink = DebugSink::to_dir(dir.path().join("nested"));
        sink.write("x.lp", "a.").unwrap();
        let written = std::fs::read_to_string(dir.path().join("nested/x.lp")).unwrap();
        assert_eq!(written, "a.");
    }
}
