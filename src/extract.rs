//! Semantic collaborators: sentence → predicates, word → part of speech.
//!
//! Parsing and coreference happen outside this crate. Their results are
//! recorded in files and served through the [`SemanticExtractor`] and
//! [`WordClassifier`] traits.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;

use crate::error::ExtractError;
use crate::graph::rules::{WordClass, WordClassifier};
use crate::predicate::Predicate;

/// Turns a (masked) sentence into predicates.
pub trait SemanticExtractor: Send + Sync {
    fn extract(&self, sentence: &str) -> Result<Vec<Predicate>, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    sentence: String,
    predicates: Vec<Predicate>,
}

/// Predicates recorded per masked sentence, loaded from JSONL
/// `{"sentence": ..., "predicates": [...]}` lines.
#[derive(Debug, Clone, Default)]
pub struct PredicateCatalog {
    entries: HashMap<String, Vec<Predicate>>,
}

impl PredicateCatalog {
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let file = std::fs::File::open(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = HashMap::new();
        for (i, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: CatalogEntry =
                serde_json::from_str(&line).map_err(|e| ExtractError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    message: e.to_string(),
                })?;
            entries.insert(normalize(&entry.sentence), entry.predicates);
        }

        tracing::info!(sentences = entries.len(), path = %path.display(), "loaded predicate catalog");
        Ok(Self { entries })
    }

    pub fn insert(&mut self, sentence: &str, predicates: Vec<Predicate>) {
        self.entries.insert(normalize(sentence), predicates);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SemanticExtractor for PredicateCatalog {
    fn extract(&self, sentence: &str) -> Result<Vec<Predicate>, ExtractError> {
        self.entries
            .get(&normalize(sentence))
            .cloned()
            .ok_or_else(|| ExtractError::UnknownSentence {
                sentence: sentence.to_string(),
            })
    }
}

/// Whitespace-collapsed, lower-cased lookup key.
fn normalize(sentence: &str) -> String {
    sentence
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Part-of-speech table loaded from a JSON `{word: class}` object.
/// Unlisted words are [`WordClass::Other`].
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    classes: HashMap<String, WordClass>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, WordClass> =
            serde_json::from_str(&content).map_err(|e| ExtractError::Parse {
                path: path.to_path_buf(),
                line: e.line(),
                message: e.to_string(),
            })?;
        Ok(Self::from_iter(raw))
    }
}

impl FromIterator<(String, WordClass)> for Lexicon {
    fn from_iter<I: IntoIterator<Item = (String, WordClass)>>(iter: I) -> Self {
        Self {
            classes: iter
                .into_iter()
                .map(|(word, class)| (word.to_lowercase(), class))
                .collect(),
        }
    }
}

impl WordClassifier for Lexicon {
    fn classify(&self, word: &str) -> WordClass {
        self.classes
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(WordClass::Other)
    }
}
