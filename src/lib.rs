// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # wsc-asp
//!
//! Pronoun resolution for Winograd-schema sentences through answer-set
//! programming.
//!
//! Extracted predicates about a sentence are turned into a logic program,
//! optionally enriched with rules learned from similar training sentences or
//! mined from a relational knowledge graph, and an external answer-set solver
//! reports which candidate the pronoun denotes.
//!
//! ## Architecture
//!
//! - **Predicates** (`predicate`, `atom`): typed facts with grounded and
//!   variablized renderings
//! - **Knowledge graph** (`graph`): memory-mapped record store, shortest-path
//!   search and relation-to-rule translation
//! - **Program builders** (`program`): direct translation, inductive learning
//!   task, and path-mined background rules
//! - **Solver gateway** (`solver`): bounded subprocess execution of the learner
//!   and the solver, answer extraction and failure capture
//! - **Resolver** (`resolver`): per-query orchestration and evaluation
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use wsc_asp::config::ResolverConfig;
//! use wsc_asp::extract::{Lexicon, PredicateCatalog};
//! use wsc_asp::problem::load_corpus;
//! use wsc_asp::resolver::Resolver;
//!
//! let corpus = load_corpus("train.jsonl".as_ref()).unwrap();
//! let test = load_corpus("test.jsonl".as_ref()).unwrap();
//! let catalog = PredicateCatalog::load("predicates.jsonl".as_ref()).unwrap();
//! let resolver = Resolver::from_config(
//!     &ResolverConfig::default(),
//!     corpus,
//!     Arc::new(catalog),
//!     Arc::new(Lexicon::default()),
//!     "debug".into(),
//! )
//! .unwrap();
//! for problem in &test {
//!     println!("{:?}", resolver.resolve(problem).decision);
//! }
//! ```

pub mod atom;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod paths;
pub mod predicate;
pub mod problem;
pub mod program;
pub mod resolver;
pub mod retrieve;
pub mod solver;
