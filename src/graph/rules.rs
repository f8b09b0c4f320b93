//! Relation paths to inference rules.
//!
//! Each traversed edge `w1 --R--> w2` becomes `atom(w2) :- atom(w1).` where the
//! shape depends on `R`:
//!
//! | relation | rule |
//! |---|---|
//! | IsA, Synonym, RelatedTo, MannerOf, CauseDesire, Desires, SimilarTo, HasProperty, CapableOf, MotivatedByGoal, DerivedFrom | `atom(w2) :- atom(w1).` |
//! | Antonym, ObstructedBy | `-atom(w2) :- atom(w1).` |
//! | UsedFor | joined with the following edge, see [`path_to_rules`] |
//!
//! A word's atom is `property(word, Y)` for adjectives and adverbs and
//! `event_subject(word, Y)` otherwise; a word reached through `UsedFor` is
//! always `event_object(word, Y)`.

use std::collections::BTreeSet;

use crate::atom::sanitize_constant;

use super::PathEdge;

/// Rule variable shared by head and body.
const RULE_VAR: &str = "Y";

/// Coarse part of speech, as reported by the semantic collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordClass {
    Adjective,
    Adverb,
    Noun,
    Verb,
    Other,
}

/// Part-of-speech classification of single words.
pub trait WordClassifier: Send + Sync {
    fn classify(&self, word: &str) -> WordClass;
}

/// What a relation label turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationShape {
    /// `atom(w2) :- atom(w1).`
    Implies,
    /// `-atom(w2) :- atom(w1).`
    Negates,
    /// Two-hop: decided together with the next edge.
    UsedFor,
}

/// Rule shape for a relation label, or `None` if the label is not supported.
pub fn relation_shape(label: &str) -> Option<RelationShape> {
    match label {
        "IsA" | "Synonym" | "RelatedTo" | "MannerOf" | "CauseDesire" | "Desires"
        | "SimilarTo" | "HasProperty" | "CapableOf" | "MotivatedByGoal" | "DerivedFrom" => {
            Some(RelationShape::Implies)
        }
        "Antonym" | "ObstructedBy" => Some(RelationShape::Negates),
        "UsedFor" => Some(RelationShape::UsedFor),
        _ => None,
    }
}

/// Which predicate a word is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomKind {
    Property,
    EventSubject,
    EventObject,
}

impl AtomKind {
    fn of(word: &str, classifier: &dyn WordClassifier) -> Self {
        match classifier.classify(word) {
            WordClass::Adjective | WordClass::Adverb => AtomKind::Property,
            _ => AtomKind::EventSubject,
        }
    }

    fn render(self, word: &str) -> String {
        let functor = match self {
            AtomKind::Property => "property",
            AtomKind::EventSubject => "event_subject",
            AtomKind::EventObject => "event_object",
        };
        format!("{functor}({}, {RULE_VAR})", sanitize_constant(word))
    }
}

fn rule(negated: bool, head: String, body: String) -> String {
    let sign = if negated { "-" } else { "" };
    format!("{sign}{head} :- {body}.")
}

/// Translate a relation path into a deduplicated set of rules.
///
/// A `UsedFor` edge `a --UsedFor--> b` consumes the edge after it,
/// `b --R--> c`: the pair yields one rule from `a` (as an event object) to
/// `c` with the shape of `R`. Unsupported labels, a trailing `UsedFor`, or a
/// `UsedFor` followed by an unsupported label are discarded with a warning.
pub fn path_to_rules(path: &[PathEdge], classifier: &dyn WordClassifier) -> BTreeSet<String> {
    let mut rules = BTreeSet::new();
    let mut i = 0;

    while i < path.len() {
        let edge = &path[i];
        match relation_shape(&edge.relation) {
            Some(shape @ (RelationShape::Implies | RelationShape::Negates)) => {
                rules.insert(rule(
                    shape == RelationShape::Negates,
                    AtomKind::of(&edge.to, classifier).render(&edge.to),
                    AtomKind::of(&edge.from, classifier).render(&edge.from),
                ));
                i += 1;
            }
            Some(RelationShape::UsedFor) => {
                let Some(next) = path.get(i + 1) else {
                    tracing::warn!(edge = %edge, "discarding trailing UsedFor edge");
                    i += 1;
                    continue;
                };
                match relation_shape(&next.relation) {
                    Some(shape @ (RelationShape::Implies | RelationShape::Negates)) => {
                        rules.insert(rule(
                            shape == RelationShape::Negates,
                            AtomKind::of(&next.to, classifier).render(&next.to),
                            AtomKind::EventObject.render(&edge.from),
                        ));
                        i += 2;
                    }
                    Some(RelationShape::UsedFor) => {
                        tracing::warn!(edge = %edge, "discarding UsedFor edge followed by UsedFor");
                        i += 1;
                    }
                    None => {
                        tracing::warn!(
                            edge = %edge,
                            next = %next,
                            "discarding UsedFor pair with unsupported relation"
                        );
                        i += 2;
                    }
                }
            }
            None => {
                tracing::warn!(relation = %edge.relation, edge = %edge, "discarding unsupported relation");
                i += 1;
            }
        }
    }
    rules
}
