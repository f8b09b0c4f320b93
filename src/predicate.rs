//! Predicate model: the logical facts extracted from a sentence.
//!
//! A [`Predicate`] is a closed sum of [`Event`], [`Property`] and [`Modifier`].
//! Every variant renders two ways:
//!
//! - [`Predicate::grounded`]: a program fact such as `event_subject(eat, cat).`
//! - [`Predicate::ungrounded`]: the same atom with every entity argument replaced
//!   by its bound variable, for use inside rule heads and bodies.
//!
//! The predicate *name* (verb lemma, property word, modifier word) is always
//! rendered literally; only the arguments reported by
//! [`Predicate::relevant_args`] are variablized.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::error::PredicateError;

/// Which role an event fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The grammatical subject of a verb.
    Subject,
    /// A direct, dative or prepositional object of a verb.
    Object,
    /// A verb that is the open clausal complement of another.
    Related,
    /// Binds a verb lemma to a per-occurrence identifier.
    Id,
}

impl EventKind {
    pub fn predicate_name(self) -> &'static str {
        match self {
            EventKind::Subject => "event_subject",
            EventKind::Object => "event_object",
            EventKind::Related => "event_related",
            EventKind::Id => "event_id",
        }
    }

    fn from_predicate_name(name: &str) -> Option<Self> {
        match name {
            "event_subject" => Some(EventKind::Subject),
            "event_object" => Some(EventKind::Object),
            "event_related" => Some(EventKind::Related),
            "event_id" => Some(EventKind::Id),
            _ => None,
        }
    }
}

/// Kind of a variablizable argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// A participant: noun phrase, candidate or pronoun.
    Entity,
    /// A verb occurrence.
    EventEntity,
}

impl EntityKind {
    /// Type predicate used for context facts and mode-bias placeholders.
    pub fn type_name(self) -> &'static str {
        match self {
            EntityKind::Entity => "entity",
            EntityKind::EventEntity => "entity_event",
        }
    }
}

/// `event_<kind>(name, args...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    pub kind: EventKind,
    pub name: String,
    pub args: Vec<String>,
}

/// `property(name, entity)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
    pub entity: String,
}

/// `mod(name, term)` or `mod(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Modifier {
    pub name: String,
    pub term: Option<String>,
}

/// A logical fact about a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PredicateRecord", into = "PredicateRecord")]
pub enum Predicate {
    Event(Event),
    Property(Property),
    Modifier(Modifier),
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

impl Predicate {
    /// Build an event from its original argument list: the first element is
    /// the event name, the rest are its arguments.
    ///
    /// Returns `None` when `parts` is empty.
    pub fn event<S: AsRef<str>>(kind: EventKind, parts: &[S]) -> Option<Self> {
        let (name, args) = parts.split_first()?;
        Some(Predicate::Event(Event {
            kind,
            name: fold(name.as_ref()),
            args: args.iter().map(|a| fold(a.as_ref())).collect(),
        }))
    }

    pub fn property(name: &str, entity: &str) -> Self {
        Predicate::Property(Property {
            name: fold(name),
            entity: fold(entity),
        })
    }

    pub fn modifier(name: &str, term: Option<&str>) -> Self {
        Predicate::Modifier(Modifier {
            name: fold(name),
            term: term.map(fold),
        })
    }

    /// The fact's predicate name as it appears in the program.
    pub fn functor(&self) -> &'static str {
        match self {
            Predicate::Event(e) => e.kind.predicate_name(),
            Predicate::Property(_) => "property",
            Predicate::Modifier(_) => "mod",
        }
    }

    /// Verb lemma, property word or modifier word.
    pub fn name(&self) -> &str {
        match self {
            Predicate::Event(e) => &e.name,
            Predicate::Property(p) => &p.name,
            Predicate::Modifier(m) => &m.name,
        }
    }

    pub fn args(&self) -> &[String] {
        match self {
            Predicate::Event(e) => &e.args,
            Predicate::Property(p) => std::slice::from_ref(&p.entity),
            Predicate::Modifier(m) => m.term.as_slice(),
        }
    }

    /// Arguments followed by the name; used to link words for path mining.
    pub fn all_args(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.args().iter().map(String::as_str).collect();
        all.push(self.name());
        all
    }

    /// The `(kind, argument)` pairs that take part in variable binding.
    ///
    /// Modifier terms are constants (they name the verb being negated or
    /// connected), so modifiers report none.
    pub fn relevant_args(&self) -> Vec<(EntityKind, &str)> {
        match self {
            Predicate::Event(e) => {
                let kind = match e.kind {
                    EventKind::Subject | EventKind::Object => EntityKind::Entity,
                    EventKind::Related | EventKind::Id => EntityKind::EventEntity,
                };
                e.args.iter().map(|a| (kind, a.as_str())).collect()
            }
            Predicate::Property(p) => vec![(EntityKind::Entity, p.entity.as_str())],
            Predicate::Modifier(_) => Vec::new(),
        }
    }

    fn atom_with(&self, args: Vec<String>) -> Atom {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(self.name().to_string());
        all.extend(args);
        Atom::new(self.functor(), all)
    }

    /// The atom with literal arguments, without a terminator.
    pub fn atom(&self) -> Atom {
        self.atom_with(self.args().to_vec())
    }

    /// Fully instantiated fact, terminated with `.`.
    pub fn grounded(&self) -> String {
        format!("{}.", self.atom())
    }

    /// Atom with each relevant argument replaced by `var_map[arg]`.
    ///
    /// Fails if any relevant argument has no binding.
    pub fn ungrounded(&self, var_map: &HashMap<String, String>) -> Result<String, PredicateError> {
        let args = match self {
            Predicate::Modifier(m) => m.term.iter().cloned().collect(),
            _ => self
                .args()
                .iter()
                .map(|arg| {
                    var_map
                        .get(arg)
                        .cloned()
                        .ok_or_else(|| PredicateError::UnboundArgument {
                            predicate: self.atom().to_string(),
                            arg: arg.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(self.atom_with(args).to_string())
    }

    /// Parse a fact produced by [`Predicate::grounded`].
    pub fn parse_fact(text: &str) -> Result<Self, PredicateError> {
        let atom = Atom::parse(text)?;
        let malformed = || PredicateError::MalformedAtom {
            text: text.to_string(),
        };

        if let Some(kind) = EventKind::from_predicate_name(&atom.name) {
            return Predicate::event(kind, &atom.args).ok_or_else(malformed);
        }
        match (atom.name.as_str(), atom.args.as_slice()) {
            ("property", [name, entity]) => Ok(Predicate::property(name, entity)),
            ("mod", [name]) => Ok(Predicate::modifier(name, None)),
            ("mod", [name, term]) => Ok(Predicate::modifier(name, Some(term))),
            ("property" | "mod", _) => Err(malformed()),
            _ => Err(PredicateError::UnknownShape { name: atom.name }),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.atom())
    }
}

// ---------------------------------------------------------------------------
// Serde form
// ---------------------------------------------------------------------------

/// Flat JSON shape of a predicate, as written by the external extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PredicateRecord {
    Event {
        kind: EventKind,
        name: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Property {
        name: String,
        entity: String,
    },
    Modifier {
        name: String,
        #[serde(default)]
        term: Option<String>,
    },
}

impl TryFrom<PredicateRecord> for Predicate {
    type Error = PredicateError;

    fn try_from(record: PredicateRecord) -> Result<Self, Self::Error> {
        Ok(match record {
            PredicateRecord::Event { kind, name, args } => {
                let mut parts = Vec::with_capacity(args.len() + 1);
                parts.push(name);
                parts.extend(args);
                Predicate::event(kind, &parts).ok_or_else(|| PredicateError::MalformedAtom {
                    text: kind.predicate_name().to_string(),
                })?
            }
            PredicateRecord::Property { name, entity } => Predicate::property(&name, &entity),
            PredicateRecord::Modifier { name, term } => Predicate::modifier(&name, term.as_deref()),
        })
    }
}

impl From<Predicate> for PredicateRecord {
    fn from(p: Predicate) -> Self {
        match p {
            Predicate::Event(e) => PredicateRecord::Event {
                kind: e.kind,
                name: e.name,
                args: e.args,
            },
            Predicate::Property(p) => PredicateRecord::Property {
                name: p.name,
                entity: p.entity,
            },
            Predicate::Modifier(m) => PredicateRecord::Modifier {
                name: m.name,
                term: m.term,
            },
        }
    }
}
