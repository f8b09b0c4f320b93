//! Query orchestration: retrieve, extract, build, solve, decide.
//!
//! A [`Resolver`] owns the training corpus and one handle per collaborator,
//! constructed once and shared by every query. Failures inside a query never
//! escape [`Resolver::resolve`]; they become [`Decision::Unknown`] with the
//! reason attached, so a batch run always completes.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ResolverConfig};
use crate::error::WscResult;
use crate::extract::SemanticExtractor;
use crate::graph::rules::WordClassifier;
use crate::graph::KnowledgeGraph;
use crate::predicate::Predicate;
use crate::problem::{mentions, Answer, WscProblem};
use crate::program::{
    DebugSink, DirectTranslationBuilder, InductiveBuilder, PathMinedBuilder, ProgramBuilder,
    Strategy, TrainingExample,
};
use crate::retrieve::{SimilarityRetriever, TfIdfRetriever};
use crate::solver::{ClingoSolver, IlaspLearner, SolverGateway};

/// How retrieved examples are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolveMode {
    /// One program per example, stopping at the first unique answer.
    #[default]
    Iterative,
    /// A single program over all examples.
    Batch,
}

impl FromStr for SolveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iterative" => Ok(SolveMode::Iterative),
            "batch" => Ok(SolveMode::Batch),
            other => Err(format!(
                "unknown mode \"{other}\" (expected iterative or batch)"
            )),
        }
    }
}

/// Why a query ended without an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownReason {
    /// No usable training example was found.
    NoExamples,
    /// The solver reported no member matching either candidate.
    NoMembers,
    /// More than one member matched a candidate.
    Ambiguous(Vec<String>),
    /// Extraction, building or solving failed.
    Failed(String),
}

impl std::fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnknownReason::NoExamples => write!(f, "no usable training examples"),
            UnknownReason::NoMembers => write!(f, "no candidate derived"),
            UnknownReason::Ambiguous(members) => {
                write!(f, "ambiguous members: {}", members.join(", "))
            }
            UnknownReason::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Candidate(Answer),
    Unknown(UnknownReason),
}

impl Decision {
    pub fn answer(&self) -> Option<Answer> {
        match self {
            Decision::Candidate(answer) => Some(*answer),
            Decision::Unknown(_) => None,
        }
    }
}

/// What went into a decision, for post-hoc analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// The query as handed to the extractor.
    pub masked_sentence: String,
    /// Sentences of the retrieved training examples, in retrieval order.
    pub similar_sentences: Vec<String>,
    /// Last program given to the solver.
    pub program: Option<String>,
    /// Raw coreferents returned by the solver for that program.
    pub members: Vec<String>,
}

/// A decision plus its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub decision: Decision,
    pub diagnostics: Diagnostics,
}

/// Wires the corpus, collaborators, builder and solver together.
pub struct Resolver {
    corpus: Vec<WscProblem>,
    extractor: Arc<dyn SemanticExtractor>,
    retriever: Box<dyn SimilarityRetriever>,
    builder: Box<dyn ProgramBuilder>,
    gateway: SolverGateway,
    mode: SolveMode,
    examples_per_query: usize,
    pronoun: String,
}

impl Resolver {
    pub fn new(
        corpus: Vec<WscProblem>,
        extractor: Arc<dyn SemanticExtractor>,
        retriever: Box<dyn SimilarityRetriever>,
        builder: Box<dyn ProgramBuilder>,
        gateway: SolverGateway,
    ) -> Self {
        Self {
            corpus,
            extractor,
            retriever,
            builder,
            gateway,
            mode: SolveMode::default(),
            examples_per_query: 1,
            pronoun: crate::problem::PRONOUN_SYMBOL.to_string(),
        }
    }

    pub fn with_mode(mut self, mode: SolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_examples_per_query(mut self, k: usize) -> Self {
        self.examples_per_query = k;
        self
    }

    pub fn with_pronoun(mut self, pronoun: impl Into<String>) -> Self {
        self.pronoun = pronoun.into();
        self
    }

    /// Build a resolver from configuration.
    ///
    /// The retriever indexes the corpus; the builder, learner, solver and
    /// knowledge graph are chosen by `config`. `debug_dir` receives failing
    /// programs and, when `config.debug` is set, every intermediate program.
    pub fn from_config(
        config: &ResolverConfig,
        corpus: Vec<WscProblem>,
        extractor: Arc<dyn SemanticExtractor>,
        classifier: Arc<dyn WordClassifier>,
        debug_dir: PathBuf,
    ) -> WscResult<Self> {
        config.validate()?;
        let pronoun = config.pronoun_symbol.clone();
        let sink = if config.debug {
            DebugSink::to_dir(&debug_dir)
        } else {
            DebugSink::disabled()
        };

        let builder: Box<dyn ProgramBuilder> = match config.strategy {
            Strategy::Direct => {
                Box::new(DirectTranslationBuilder::new(&pronoun).with_debug(sink))
            }
            Strategy::Inductive => {
                let learner = IlaspLearner::new(
                    &config.learner.binary,
                    config.learner.args.clone(),
                    config.learner.timeout(),
                );
                Box::new(InductiveBuilder::new(&pronoun, Arc::new(learner)).with_debug(sink))
            }
            Strategy::PathMined => {
                let (Some(records), Some(index)) = (&config.graph.records, &config.graph.index)
                else {
                    return Err(ConfigError::Invalid {
                        field: "graph",
                        message: "the path-mined strategy needs both graph.records and graph.index"
                            .into(),
                    }
                    .into());
                };
                let graph = Arc::new(KnowledgeGraph::open(records, index)?);
                Box::new(
                    PathMinedBuilder::new(&pronoun, graph, classifier)
                        .with_strategy(config.graph.search)
                        .with_debug(sink),
                )
            }
        };

        let retrieval: Vec<String> = corpus
            .iter()
            .map(|p| p.retrieval_sentence(&pronoun))
            .collect();
        let retriever = Box::new(TfIdfRetriever::new(&retrieval));

        let solver = ClingoSolver::new(
            &config.solver.binary,
            config.solver.args.clone(),
            config.solver.timeout(),
        );
        let gateway = SolverGateway::new(Box::new(solver), debug_dir);

        tracing::info!(
            strategy = %config.strategy,
            mode = ?config.mode,
            corpus = corpus.len(),
            "resolver ready"
        );

        Ok(Self::new(corpus, extractor, retriever, builder, gateway)
            .with_mode(config.mode)
            .with_examples_per_query(config.examples_per_query)
            .with_pronoun(pronoun))
    }

    pub fn corpus(&self) -> &[WscProblem] {
        &self.corpus
    }

    /// Resolve the pronoun of `problem`.
    pub fn resolve(&self, problem: &WscProblem) -> Resolution {
        let mut diagnostics = Diagnostics {
            masked_sentence: problem.masked_sentence(&self.pronoun),
            ..Default::default()
        };

        let test_predicates = match self.extractor.extract(&diagnostics.masked_sentence) {
            Ok(predicates) => predicates,
            Err(err) => {
                tracing::warn!(sentence = problem.sentence(), error = %err, "extraction failed");
                return Resolution {
                    decision: Decision::Unknown(UnknownReason::Failed(err.to_string())),
                    diagnostics,
                };
            }
        };

        let examples = self.training_examples(problem, &mut diagnostics);
        if examples.is_empty() && self.builder.uses_examples() {
            return Resolution {
                decision: Decision::Unknown(UnknownReason::NoExamples),
                diagnostics,
            };
        }

        let decision = match self.mode {
            SolveMode::Batch => self.attempt(&examples, problem, &test_predicates, &mut diagnostics),
            SolveMode::Iterative if examples.is_empty() => {
                self.attempt(&[], problem, &test_predicates, &mut diagnostics)
            }
            SolveMode::Iterative => {
                let mut last = Decision::Unknown(UnknownReason::NoMembers);
                for example in &examples {
                    last = self.attempt(
                        std::slice::from_ref(example),
                        problem,
                        &test_predicates,
                        &mut diagnostics,
                    );
                    if matches!(last, Decision::Candidate(_)) {
                        break;
                    }
                }
                last
            }
        };

        match &decision {
            Decision::Candidate(answer) => tracing::info!(
                sentence = problem.sentence(),
                answer = answer.index(),
                "resolved"
            ),
            Decision::Unknown(reason) => tracing::info!(
                sentence = problem.sentence(),
                reason = %reason,
                "unresolved"
            ),
        }

        Resolution {
            decision,
            diagnostics,
        }
    }

    /// Retrieve and extract the nearest training problems, skipping the
    /// query itself and examples the extractor does not know.
    fn training_examples(
        &self,
        problem: &WscProblem,
        diagnostics: &mut Diagnostics,
    ) -> Vec<TrainingExample> {
        let query = problem.retrieval_sentence(&self.pronoun);
        let mut examples = Vec::new();
        for index in self.retriever.nearest(&query, self.examples_per_query + 1) {
            if examples.len() == self.examples_per_query {
                break;
            }
            let Some(candidate) = self.corpus.get(index) else {
                continue;
            };
            if candidate == problem {
                continue;
            }
            match self.extractor.extract(&candidate.masked_sentence(&self.pronoun)) {
                Ok(predicates) => {
                    diagnostics
                        .similar_sentences
                        .push(candidate.sentence().to_string());
                    examples.push(TrainingExample::new(candidate.clone(), predicates));
                }
                Err(err) => {
                    tracing::warn!(
                        sentence = candidate.sentence(),
                        error = %err,
                        "skipping training example without predicates"
                    );
                }
            }
        }
        examples
    }

    fn attempt(
        &self,
        examples: &[TrainingExample],
        problem: &WscProblem,
        test_predicates: &[Predicate],
        diagnostics: &mut Diagnostics,
    ) -> Decision {
        let program = match self.builder.build(examples, problem, test_predicates) {
            Ok(program) => program,
            Err(err) => {
                tracing::warn!(builder = self.builder.name(), error = %err, "build failed");
                return Decision::Unknown(UnknownReason::Failed(err.to_string()));
            }
        };
        diagnostics.program = Some(program.clone());

        let members = match self.gateway.run(&program) {
            Ok(members) => members,
            Err(err) => {
                tracing::warn!(error = %err, "query aborted");
                diagnostics.members.clear();
                return Decision::Unknown(UnknownReason::Failed(err.to_string()));
            }
        };
        diagnostics.members = members.iter().cloned().collect();
        decide(problem, &members)
    }
}

/// Filter solver members against the two candidates.
///
/// Exactly one matching member that names exactly one candidate is an
/// answer; anything else is unknown.
pub fn decide(problem: &WscProblem, members: &BTreeSet<String>) -> Decision {
    let c1 = problem.candidate(Answer::First);
    let c2 = problem.candidate(Answer::Second);
    let matching: Vec<&String> = members
        .iter()
        .filter(|m| mentions(c1, m) || mentions(c2, m))
        .collect();

    match matching.as_slice() {
        [] => Decision::Unknown(UnknownReason::NoMembers),
        [member] => match (mentions(c1, member), mentions(c2, member)) {
            (true, false) => Decision::Candidate(Answer::First),
            (false, true) => Decision::Candidate(Answer::Second),
            _ => Decision::Unknown(UnknownReason::Ambiguous(vec![(*member).clone()])),
        },
        many => Decision::Unknown(UnknownReason::Ambiguous(
            many.iter().map(|m| (*m).clone()).collect(),
        )),
    }
}

/// Running tally of decisions against gold answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub size: usize,
    pub unknown: usize,
    pub correct: usize,
}

impl Evaluation {
    pub fn record(&mut self, decision: &Decision, gold: Answer) {
        self.size += 1;
        match decision.answer() {
            None => self.unknown += 1,
            Some(answer) if answer == gold => self.correct += 1,
            Some(_) => {}
        }
    }

    /// Fraction of all queries answered correctly.
    pub fn accuracy(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.correct as f64 / self.size as f64
        }
    }

    /// Fraction of answered queries that were correct.
    pub fn precision(&self) -> f64 {
        let answered = self.size - self.unknown;
        if answered == 0 {
            0.0
        } else {
            self.correct as f64 / answered as f64
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size: {}, unknown: {}, correct: {}, accuracy: {:.3}",
            self.size,
            self.unknown,
            self.correct,
            self.accuracy()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::error::{BuildError, SolverError};
    use crate::extract::PredicateCatalog;
    use crate::predicate::EventKind;
    use crate::solver::{AnswerSetSolver, Model};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const P: &str = "target_pronoun";

    fn members(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn trophy() -> WscProblem {
        WscProblem::new(
            "The trophy doesn't fit into the brown suitcase because _ is too large.",
            "the trophy",
            "the suitcase",
            Answer::First,
        )
    }

    #[test]
    fn decide_unique_member() {
        assert_eq!(
            decide(&trophy(), &members(&["trophy", "target_pronoun"])),
            Decision::Candidate(Answer::First)
        );
        assert_eq!(
            decide(&trophy(), &members(&["the_suitcase"])),
            Decision::Candidate(Answer::Second)
        );
    }

    #[test]
    fn decide_empty_and_ambiguous() {
        assert_eq!(
            decide(&trophy(), &members(&["brown"])),
            Decision::Unknown(UnknownReason::NoMembers)
        );
        assert!(matches!(
            decide(&trophy(), &members(&["trophy", "suitcase"])),
            Decision::Unknown(UnknownReason::Ambiguous(_))
        ));
        // "the" names both candidates.
        assert!(matches!(
            decide(&trophy(), &members(&["the"])),
            Decision::Unknown(UnknownReason::Ambiguous(_))
        ));
    }

    #[test]
    fn evaluation_tallies() {
        let mut eval = Evaluation::default();
        eval.record(&Decision::Candidate(Answer::First), Answer::First);
        eval.record(&Decision::Candidate(Answer::First), Answer::Second);
        eval.record(&Decision::Unknown(UnknownReason::NoMembers), Answer::First);
        eval.record(&Decision::Candidate(Answer::Second), Answer::Second);
        assert_eq!(eval.size, 4);
        assert_eq!(eval.unknown, 1);
        assert_eq!(eval.correct, 2);
        assert!((eval.accuracy() - 0.5).abs() < 1e-9);
        assert!((eval.precision() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(Evaluation::default().accuracy(), 0.0);
    }

    /// Answers every program with the coreferents listed for the first
    /// matching marker in the program text.
    struct ScriptedSolver {
        answers: Vec<(&'static str, &'static str)>,
        programs: Arc<Mutex<Vec<String>>>,
    }

    impl AnswerSetSolver for ScriptedSolver {
        fn solve(&self, program: &str) -> Result<Vec<Model>, SolverError> {
            self.programs.lock().unwrap().push(program.to_string());
            if program.contains("broken") {
                return Err(SolverError::Runtime {
                    message: "syntax error".into(),
                });
            }
            Ok(self
                .answers
                .iter()
                .filter(|(marker, _)| program.contains(marker))
                .take(1)
                .map(|(_, member)| {
                    Model::new(vec![Atom::new("coref", vec![P.into(), (*member).into()])])
                })
                .collect())
        }
    }

    struct Fixture {
        dir: TempDir,
        corpus: Vec<WscProblem>,
        catalog: PredicateCatalog,
    }

    fn fixture() -> Fixture {
        let corpus = vec![
            WscProblem::new("The cat ate the rat because _ was hungry.", "cat", "rat", Answer::First),
            WscProblem::new("The dog chased the cat because _ was scared.", "dog", "cat", Answer::Second),
            WscProblem::new("The fox ate the hen because _ was hungry.", "fox", "hen", Answer::First),
        ];
        let mut catalog = PredicateCatalog::default();
        catalog.insert(
            &corpus[0].masked_sentence(P),
            vec![
                Predicate::event(EventKind::Subject, &["eat", "cat"]).unwrap(),
                Predicate::event(EventKind::Object, &["eat", "rat"]).unwrap(),
                Predicate::property("hungry", P),
            ],
        );
        catalog.insert(
            &corpus[1].masked_sentence(P),
            vec![
                Predicate::event(EventKind::Subject, &["chase", "dog"]).unwrap(),
                Predicate::event(EventKind::Object, &["chase", "cat"]).unwrap(),
                Predicate::property("scared", P),
            ],
        );
        catalog.insert(
            &corpus[2].masked_sentence(P),
            vec![
                Predicate::event(EventKind::Subject, &["eat", "fox"]).unwrap(),
                Predicate::event(EventKind::Object, &["eat", "hen"]).unwrap(),
                Predicate::property("hungry", P),
            ],
        );
        Fixture {
            dir: TempDir::new().unwrap(),
            corpus,
            catalog,
        }
    }

    fn resolver(
        fx: &Fixture,
        answers: Vec<(&'static str, &'static str)>,
        programs: Arc<Mutex<Vec<String>>>,
    ) -> Resolver {
        let retrieval: Vec<String> = fx.corpus.iter().map(|p| p.retrieval_sentence(P)).collect();
        Resolver::new(
            fx.corpus.clone(),
            Arc::new(fx.catalog.clone()),
            Box::new(TfIdfRetriever::new(&retrieval)),
            Box::new(DirectTranslationBuilder::new(P)),
            SolverGateway::new(Box::new(ScriptedSolver { answers, programs }), fx.dir.path()),
        )
    }

    #[test]
    fn resolves_with_nearest_example() {
        let fx = fixture();
        let programs = Arc::new(Mutex::new(Vec::new()));
        let resolver = resolver(&fx, vec![("event_subject(eat, fox).", "fox")], programs.clone());

        let resolution = resolver.resolve(&fx.corpus[2]);
        assert_eq!(resolution.decision, Decision::Candidate(Answer::First));
        assert_eq!(
            resolution.diagnostics.similar_sentences,
            vec!["The cat ate the rat because _ was hungry."]
        );
        assert_eq!(resolution.diagnostics.members, vec!["fox"]);
        let program = resolution.diagnostics.program.unwrap();
        assert!(program.contains("coref(V2, V0) :- event_subject(eat, V0)"));
        assert_eq!(programs.lock().unwrap().len(), 1);
    }

    #[test]
    fn iterative_mode_moves_to_the_next_example() {
        let fx = fixture();
        let programs = Arc::new(Mutex::new(Vec::new()));
        // Only a program built from the dog/cat example answers.
        let resolver = resolver(&fx, vec![("chase", "fox")], programs.clone())
            .with_examples_per_query(2);

        let resolution = resolver.resolve(&fx.corpus[2]);
        assert_eq!(resolution.decision, Decision::Candidate(Answer::First));
        assert_eq!(programs.lock().unwrap().len(), 2);
    }

    #[test]
    fn batch_mode_solves_once() {
        let fx = fixture();
        let programs = Arc::new(Mutex::new(Vec::new()));
        let resolver = resolver(&fx, vec![("chase", "fox")], programs.clone())
            .with_examples_per_query(2)
            .with_mode(SolveMode::Batch);

        let resolution = resolver.resolve(&fx.corpus[2]);
        assert_eq!(resolution.decision, Decision::Candidate(Answer::First));
        assert_eq!(programs.lock().unwrap().len(), 1);
        assert_eq!(resolution.diagnostics.similar_sentences.len(), 2);
    }

    #[test]
    fn unknown_sentence_is_unknown_not_an_error() {
        let fx = fixture();
        let resolver = resolver(&fx, Vec::new(), Arc::new(Mutex::new(Vec::new())));
        let stranger = WscProblem::new("Nobody knows _ here.", "a", "b", Answer::First);
        let resolution = resolver.resolve(&stranger);
        assert!(matches!(
            resolution.decision,
            Decision::Unknown(UnknownReason::Failed(_))
        ));
    }

    #[test]
    fn solver_failure_is_unknown_with_program_kept() {
        let fx = fixture();
        let mut catalog = fx.catalog.clone();
        catalog.insert(
            &fx.corpus[2].masked_sentence(P),
            vec![
                Predicate::event(EventKind::Subject, &["broken", "fox"]).unwrap(),
                Predicate::property("hungry", P),
            ],
        );
        let retrieval: Vec<String> = fx.corpus.iter().map(|p| p.retrieval_sentence(P)).collect();
        let resolver = Resolver::new(
            fx.corpus.clone(),
            Arc::new(catalog),
            Box::new(TfIdfRetriever::new(&retrieval)),
            Box::new(DirectTranslationBuilder::new(P)),
            SolverGateway::new(
                Box::new(ScriptedSolver {
                    answers: Vec::new(),
                    programs: Arc::new(Mutex::new(Vec::new())),
                }),
                fx.dir.path(),
            ),
        );

        let resolution = resolver.resolve(&fx.corpus[2]);
        assert!(matches!(
            resolution.decision,
            Decision::Unknown(UnknownReason::Failed(_))
        ));
        assert!(resolution.diagnostics.program.unwrap().contains("broken"));
        assert!(fx.dir.path().join("debug_asp_runner_0").exists());
    }

    #[test]
    fn build_failure_is_unknown() {
        struct Failing;
        impl ProgramBuilder for Failing {
            fn build(
                &self,
                _: &[TrainingExample],
                _: &WscProblem,
                _: &[Predicate],
            ) -> Result<String, BuildError> {
                Err(BuildError::LearnerFailed {
                    status: 1,
                    stderr: "bad task".into(),
                })
            }
            fn name(&self) -> &'static str {
                "failing"
            }
        }

        let fx = fixture();
        let retrieval: Vec<String> = fx.corpus.iter().map(|p| p.retrieval_sentence(P)).collect();
        let resolver = Resolver::new(
            fx.corpus.clone(),
            Arc::new(fx.catalog.clone()),
            Box::new(TfIdfRetriever::new(&retrieval)),
            Box::new(Failing),
            SolverGateway::new(
                Box::new(ScriptedSolver {
                    answers: Vec::new(),
                    programs: Arc::new(Mutex::new(Vec::new())),
                }),
                fx.dir.path(),
            ),
        );
        let resolution = resolver.resolve(&fx.corpus[0]);
        assert!(matches!(
            resolution.decision,
            Decision::Unknown(UnknownReason::Failed(_))
        ));
        assert!(resolution.diagnostics.program.is_none());
    }

    #[test]
    fn solve_mode_parses() {
        assert_eq!("batch".parse::<SolveMode>().unwrap(), SolveMode::Batch);
        assert_eq!("Iterative".parse::<SolveMode>().unwrap(), SolveMode::Iterative);
        assert!("sometimes".parse::<SolveMode>().is_err());
    }
}
