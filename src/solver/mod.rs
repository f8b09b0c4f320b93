//! Solver gateway: external tool execution and answer extraction.
//!
//! [`SolverGateway::run`] hands a program to an [`AnswerSetSolver`] and
//! returns every `Y` of a `coref(_, Y)` atom in any returned model. A program
//! the solver rejects is saved to a numbered debug file before the error is
//! returned, so it can be inspected after the run.

pub mod clingo;
pub mod learner;
pub mod process;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::atom::Atom;
use crate::error::SolverError;

pub use clingo::ClingoSolver;
pub use learner::{IlaspLearner, InductiveLearner};

/// Result type for solver operations.
pub type SolverResult<T> = std::result::Result<T, SolverError>;

/// Predicate naming a coreference in a model.
const COREF: &str = "coref";

/// One stable model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    atoms: Vec<Atom>,
}

impl Model {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Atoms with the given predicate name.
    pub fn atoms_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Atom> + 'a {
        self.atoms.iter().filter(move |atom| atom.name == name)
    }
}

/// An answer-set solver: a program in, zero or more models out.
pub trait AnswerSetSolver: Send + Sync {
    fn solve(&self, program: &str) -> SolverResult<Vec<Model>>;
}

/// Second arguments of all binary `coref` atoms, across all models.
pub fn coreferents(models: &[Model]) -> BTreeSet<String> {
    models
        .iter()
        .flat_map(|model| model.atoms_named(COREF))
        .filter_map(|atom| match atom.args.as_slice() {
            [_, referent] => Some(referent.clone()),
            _ => None,
        })
        .collect()
}

/// Runs programs and extracts coreferents, capturing failing programs.
pub struct SolverGateway {
    solver: Box<dyn AnswerSetSolver>,
    debug_dir: PathBuf,
    failures: AtomicUsize,
}

impl SolverGateway {
    pub fn new(solver: Box<dyn AnswerSetSolver>, debug_dir: impl Into<PathBuf>) -> Self {
        Self {
            solver,
            debug_dir: debug_dir.into(),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn debug_dir(&self) -> &Path {
        &self.debug_dir
    }

    /// Solve `program` and return the union of coreferents over all models.
    ///
    /// On a runtime, output or timeout failure the program and the error are
    /// written to `debug_asp_runner_<n>` and [`SolverError::ProgramFailed`]
    /// names that file.
    pub fn run(&self, program: &str) -> SolverResult<BTreeSet<String>> {
        match self.solver.solve(program) {
            Ok(models) => {
                let found = coreferents(&models);
                tracing::debug!(
                    models = models.len(),
                    coreferents = found.len(),
                    "solver finished"
                );
                Ok(found)
            }
            Err(
                err @ (SolverError::Runtime { .. }
                | SolverError::Output { .. }
                | SolverError::Timeout { .. }),
            ) => {
                let debug_file = self.save_failure(program, &err)?;
                tracing::error!(
                    error = %err,
                    debug_file = %debug_file.display(),
                    "solver failed"
                );
                Err(SolverError::ProgramFailed {
                    debug_file,
                    source: Box::new(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn save_failure(&self, program: &str, err: &SolverError) -> SolverResult<PathBuf> {
        let n = self.failures.fetch_add(1, Ordering::Relaxed);
        let path = self.debug_dir.join(format!("debug_asp_runner_{n}"));
        let content = format!("Failed program is:\n{program}\n\n\n\n\n{err}\n");
        std::fs::create_dir_all(&self.debug_dir)
            .and_then(|()| std::fs::write(&path, content))
            .map_err(|source| SolverError::DebugWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

impl std::fmt::Debug for SolverGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverGateway")
            .field("debug_dir", &self.debug_dir)
            .field("failures", &self.failures.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Returns a fixed answer for every program.
    struct Stub(fn() -> SolverResult<Vec<Model>>);

    impl AnswerSetSolver for Stub {
        fn solve(&self, _program: &str) -> SolverResult<Vec<Model>> {
            (self.0)()
        }
    }

    fn model(atoms: &[&str]) -> Model {
        Model::new(atoms.iter().map(|a| Atom::parse(a).unwrap()).collect())
    }

    #[test]
    fn union_across_models() {
        let dir = TempDir::new().unwrap();
        let gateway = SolverGateway::new(
            Box::new(Stub(|| {
                Ok(vec![model(&["coref(p, a)", "property(x, p)"]), model(&["coref(p, b)"])])
            })),
            dir.path(),
        );
        let found = gateway.run("").unwrap();
        assert_eq!(found, BTreeSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn no_models_no_coreferents() {
        let dir = TempDir::new().unwrap();
        let gateway = SolverGateway::new(Box::new(Stub(|| Ok(Vec::new()))), dir.path());
        assert!(gateway.run("").unwrap().is_empty());
    }

    #[test]
    fn non_binary_coref_atoms_are_ignored() {
        let models = vec![model(&["coref(a)", "coref(p, c)", "coref(p, c, d)"])];
        assert_eq!(coreferents(&models), BTreeSet::from(["c".to_string()]));
    }

    #[test]
    fn failures_are_numbered_debug_files() {
        let dir = TempDir::new().unwrap();
        let gateway = SolverGateway::new(
            Box::new(Stub(|| {
                Err(SolverError::Runtime {
                    message: "unsafe variables".into(),
                })
            })),
            dir.path().join("debug"),
        );

        for expected in ["debug_asp_runner_0", "debug_asp_runner_1"] {
            match gateway.run("coref(X, Y) :- a.") {
                Err(SolverError::ProgramFailed { debug_file, source }) => {
                    assert_eq!(debug_file.file_name().unwrap(), expected);
                    assert!(matches!(*source, SolverError::Runtime { .. }));
                    let saved = std::fs::read_to_string(&debug_file).unwrap();
                    assert!(saved.starts_with("Failed program is:\ncoref(X, Y) :- a."));
                    assert!(saved.contains("unsafe variables"));
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn spawn_failures_are_not_saved() {
        let dir = TempDir::new().unwrap();
        let gateway = SolverGateway::new(
            Box::new(Stub(|| {
                Err(SolverError::Spawn {
                    binary: "clingo".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            })),
            dir.path(),
        );
        assert!(matches!(gateway.run("a."), Err(SolverError::Spawn { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
