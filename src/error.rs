//! Rich diagnostic error types for the resolution pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so operators know which
//! stage of a query failed and what to look at.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the CLI.
#[derive(Debug, Error, Diagnostic)]
pub enum WscError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] crate::config::ConfigError),
}

// ---------------------------------------------------------------------------
// Predicate errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PredicateError {
    #[error("no variable bound for argument \"{arg}\" of {predicate}")]
    #[diagnostic(
        code(wsc::predicate::unbound),
        help(
            "Every entity argument must be bound before a predicate is variablized. \
             Build the variable map from the same predicate list that is being rendered."
        )
    )]
    UnboundArgument { predicate: String, arg: String },

    #[error("malformed atom: \"{text}\"")]
    #[diagnostic(
        code(wsc::predicate::malformed),
        help("Atoms are written `name(arg, ...)` with an optional trailing `.`.")
    )]
    MalformedAtom { text: String },

    #[error("\"{name}\" is not a known predicate shape")]
    #[diagnostic(
        code(wsc::predicate::unknown_shape),
        help(
            "Facts are one of event_subject, event_object, event_related, event_id, \
             property or mod."
        )
    )]
    UnknownShape { name: String },
}

// ---------------------------------------------------------------------------
// Knowledge graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("I/O error on {}", .path.display())]
    #[diagnostic(
        code(wsc::graph::io),
        help("Check that the record store and index files exist and are readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at line {line}: {message}")]
    #[diagnostic(
        code(wsc::graph::record),
        help(
            "Each line of the record store must be a JSON object with a single key \
             (the node) mapping to a list of edges carrying name, relation and weight. \
             Re-run the crawler or rebuild the store."
        )
    )]
    Record { line: usize, message: String },

    #[error("malformed node index: {message}")]
    #[diagnostic(
        code(wsc::graph::index),
        help("Rebuild the index with `wsc graph index`.")
    )]
    Index { message: String },

    #[error("index points \"{node}\" at line {line}, which holds another node or does not exist")]
    #[diagnostic(
        code(wsc::graph::stale_index),
        help("The index is out of date with the record store. Rebuild it with `wsc graph index`.")
    )]
    StaleIndex { node: String, line: usize },
}

// ---------------------------------------------------------------------------
// Program builder errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("cannot build a rule for \"{sentence}\": {reason}")]
    #[diagnostic(
        code(wsc::build::construction),
        help(
            "The pronoun or the correct candidate never appears among the example's \
             predicates. The example is skipped; inspect the extractor output for it."
        )
    )]
    Construction { sentence: String, reason: String },

    #[error("failed to launch learner `{binary}`")]
    #[diagnostic(
        code(wsc::build::learner_spawn),
        help("Ensure the inductive learner is installed and `learner.binary` points at it.")
    )]
    LearnerSpawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("learner exited with status {status}: {stderr}")]
    #[diagnostic(
        code(wsc::build::learner_failed),
        help("Run the learner by hand on the retained task file (enable `debug`) to see the full error.")
    )]
    LearnerFailed { status: i32, stderr: String },

    #[error("temporary file error")]
    #[diagnostic(
        code(wsc::build::tempfile),
        help("Check that the system temp directory is writable.")
    )]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    #[error("could not write debug artifact {}", .path.display())]
    #[diagnostic(
        code(wsc::build::debug_write),
        help("Check that the debug directory exists and is writable.")
    )]
    DebugWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Solver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SolverError {
    #[error("failed to launch solver `{binary}`")]
    #[diagnostic(
        code(wsc::solver::spawn),
        help("Ensure the answer-set solver is installed and `solver.binary` points at it.")
    )]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("solver rejected the program: {message}")]
    #[diagnostic(
        code(wsc::solver::runtime),
        help("The program is malformed or triggered a runtime error in the solver.")
    )]
    Runtime { message: String },

    #[error("solver timed out after {secs}s")]
    #[diagnostic(
        code(wsc::solver::timeout),
        help("Raise or unset `solver.timeout_secs`.")
    )]
    Timeout { secs: u64 },

    #[error("unreadable solver output: {message}")]
    #[diagnostic(
        code(wsc::solver::output),
        help("The solver must be run with JSON output (`--outf=2`).")
    )]
    Output { message: String },

    #[error("solver failed, program saved to {}", .debug_file.display())]
    #[diagnostic(
        code(wsc::solver::program_failed),
        help("Open the debug file: it holds the failing program followed by the solver error.")
    )]
    ProgramFailed {
        debug_file: PathBuf,
        #[source]
        source: Box<SolverError>,
    },

    #[error("could not write solver debug file {}", .path.display())]
    #[diagnostic(
        code(wsc::solver::debug_write),
        help("Check that the debug directory exists and is writable.")
    )]
    DebugWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("no predicates recorded for sentence: \"{sentence}\"")]
    #[diagnostic(
        code(wsc::extract::unknown_sentence),
        help("Regenerate the predicate catalog so that it covers this sentence.")
    )]
    UnknownSentence { sentence: String },

    #[error("I/O error on {}", .path.display())]
    #[diagnostic(code(wsc::extract::io), help("Check the catalog or lexicon path."))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog entry at {}:{line}: {message}", .path.display())]
    #[diagnostic(
        code(wsc::extract::parse),
        help("Catalog lines are JSON objects with `sentence` and `predicates` keys.")
    )]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

#[derive(Debug, Error, Diagnostic)]
pub enum CorpusError {
    #[error("I/O error on {}", .path.display())]
    #[diagnostic(code(wsc::corpus::io), help("Check the corpus path."))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed problem at {}:{line}: {message}", .path.display())]
    #[diagnostic(
        code(wsc::corpus::parse),
        help("Problems are JSON lines with `sentence`, `option1`, `option2` and `answer`.")
    )]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("answer must be 1 or 2, got {answer}")]
    #[diagnostic(code(wsc::corpus::answer), help("Fix the `answer` field of the problem."))]
    InvalidAnswer { answer: String },
}

/// Convenience alias for functions returning crate results.
pub type WscResult<T> = std::result::Result<T, WscError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_error_converts_to_build_error() {
        let err = PredicateError::UnboundArgument {
            predicate: "property(hungry, it)".into(),
            arg: "it".into(),
        };
        let build: BuildError = err.into();
        assert!(matches!(
            build,
            BuildError::Predicate(PredicateError::UnboundArgument { .. })
        ));
    }

    #[test]
    fn solver_error_converts_to_wsc_error() {
        let err = SolverError::Runtime {
            message: "parse error".into(),
        };
        let wsc: WscError = err.into();
        assert!(matches!(wsc, WscError::Solver(SolverError::Runtime { .. })));
    }

    #[test]
    fn program_failed_names_debug_file() {
        let err = SolverError::ProgramFailed {
            debug_file: PathBuf::from("debug/debug_asp_runner_3"),
            source: Box::new(SolverError::Runtime {
                message: "boom".into(),
            }),
        };
        let msg = format!("{err}");
        assert!(msg.contains("debug_asp_runner_3"));
    }
}
