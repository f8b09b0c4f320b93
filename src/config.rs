//! Resolver configuration, persisted as TOML.
//!
//! The default file lives at `$XDG_CONFIG_HOME/wsc-asp/config.toml`. Every
//! field has a serde default, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::traverse::SearchStrategy;
use crate::problem::PRONOUN_SYMBOL;
use crate::program::Strategy;
use crate::resolver::SolveMode;

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {}", .path.display())]
    #[diagnostic(
        code(wsc::config::read),
        help("Ensure the config file exists, or create one with `wsc config init`.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {message}", .path.display())]
    #[diagnostic(
        code(wsc::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    Parse { path: PathBuf, message: String },

    #[error("failed to write config: {}", .path.display())]
    #[diagnostic(
        code(wsc::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {message}")]
    #[diagnostic(code(wsc::config::serialize))]
    Serialize { message: String },

    #[error("invalid value for `{field}`: {message}")]
    #[diagnostic(
        code(wsc::config::invalid),
        help("Fix the value in the config file or override it on the command line.")
    )]
    Invalid { field: &'static str, message: String },

    #[error("cannot determine home directory")]
    #[diagnostic(
        code(wsc::config::no_home),
        help("Set the HOME environment variable or pass explicit paths.")
    )]
    NoHome,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level resolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Program builder to use.
    #[serde(default)]
    pub strategy: Strategy,
    /// One example per attempt, or all examples in one program.
    #[serde(default)]
    pub mode: SolveMode,
    /// Training examples retrieved per query.
    #[serde(default = "default_examples_per_query")]
    pub examples_per_query: usize,
    /// Symbol that replaces the pronoun in masked sentences.
    #[serde(default = "default_pronoun_symbol")]
    pub pronoun_symbol: String,
    /// Keep intermediate programs in the debug directory.
    #[serde(default)]
    pub debug: bool,
    /// Where failing programs and debug artifacts go. Defaults to the XDG state directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<PathBuf>,
    #[serde(default)]
    pub learner: LearnerConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

fn default_examples_per_query() -> usize {
    1
}
fn default_pronoun_symbol() -> String {
    PRONOUN_SYMBOL.into()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            mode: SolveMode::default(),
            examples_per_query: default_examples_per_query(),
            pronoun_symbol: default_pronoun_symbol(),
            debug: false,
            debug_dir: None,
            learner: LearnerConfig::default(),
            solver: SolverConfig::default(),
            graph: GraphConfig::default(),
        }
    }
}

/// The inductive learner subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerConfig {
    #[serde(default = "default_learner_binary")]
    pub binary: String,
    /// Arguments placed before the task file path.
    #[serde(default = "default_learner_args")]
    pub args: Vec<String>,
    /// Wall-clock limit; the process group is cancelled when it passes.
    #[serde(default = "default_learner_timeout")]
    pub timeout_secs: u64,
}

fn default_learner_binary() -> String {
    "ILASP".into()
}
fn default_learner_args() -> Vec<String> {
    vec!["--clingo5".into(), "-q".into(), "--version=2i".into()]
}
fn default_learner_timeout() -> u64 {
    200
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            binary: default_learner_binary(),
            args: default_learner_args(),
            timeout_secs: default_learner_timeout(),
        }
    }
}

impl LearnerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The answer-set solver subprocess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_solver_binary")]
    pub binary: String,
    /// Extra arguments; output format and model count are always set.
    #[serde(default)]
    pub args: Vec<String>,
    /// Optional wall-clock limit. Unset means wait for the solver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_solver_binary() -> String {
    "clingo".into()
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            binary: default_solver_binary(),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The knowledge graph used by the path-mined strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Line-oriented record store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<PathBuf>,
    /// Node → line index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<PathBuf>,
    #[serde(default)]
    pub search: SearchStrategy,
}

impl ResolverConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject settings the resolver cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field, message: &str| {
            Err(ConfigError::Invalid {
                field,
                message: message.to_string(),
            })
        };

        if self.examples_per_query == 0 {
            return invalid("examples_per_query", "must be at least 1");
        }
        if self.pronoun_symbol.trim().is_empty() {
            return invalid("pronoun_symbol", "must not be empty");
        }
        if !self
            .pronoun_symbol
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
        {
            return invalid("pronoun_symbol", "must start with a lower-case letter");
        }
        if self.learner.timeout_secs == 0 {
            return invalid("learner.timeout_secs", "must be greater than zero");
        }
        if self.solver.timeout_secs == Some(0) {
            return invalid("solver.timeout_secs", "must be greater than zero when set");
        }
        if let SearchStrategy::Dfs { max_depth: 0 } = self.graph.search {
            return invalid("graph.search.max_depth", "must be at least 1");
        }
        if self.strategy == Strategy::PathMined
            && (self.graph.records.is_none() || self.graph.index.is_none())
        {
            return invalid(
                "graph",
                "the path-mined strategy needs both graph.records and graph.index",
            );
        }
        Ok(())
    }
}
