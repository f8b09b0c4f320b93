//! Winograd-schema problems and candidate matching.

use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Reserved symbol that replaces the ambiguous pronoun in masked sentences.
pub const PRONOUN_SYMBOL: &str = "target_pronoun";

/// Token that replaces both candidates in the retrieval form of a sentence.
const CANDIDATE_MASK: &str = "candidate";

/// Which of the two candidates a problem (or a decision) points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    First,
    Second,
}

impl Answer {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Answer::First),
            2 => Some(Answer::Second),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Answer::First => 1,
            Answer::Second => 2,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Answer::First => Answer::Second,
            Answer::Second => Answer::First,
        }
    }
}

/// A sentence with a masked pronoun (`_`) and two candidate referents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WscProblem {
    sentence: String,
    candidate1: String,
    candidate2: String,
    answer: Answer,
}

impl WscProblem {
    pub fn new(
        sentence: impl Into<String>,
        candidate1: impl Into<String>,
        candidate2: impl Into<String>,
        answer: Answer,
    ) -> Self {
        Self {
            sentence: sentence.into(),
            candidate1: candidate1.into(),
            candidate2: candidate2.into(),
            answer,
        }
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }

    pub fn candidate(&self, which: Answer) -> &str {
        match which {
            Answer::First => &self.candidate1,
            Answer::Second => &self.candidate2,
        }
    }

    pub fn correct_candidate(&self) -> &str {
        self.candidate(self.answer)
    }

    pub fn incorrect_candidate(&self) -> &str {
        self.candidate(self.answer.other())
    }

    /// Sentence handed to the extractor: `_` becomes `pronoun` and each
    /// multi-word candidate becomes one underscore-joined token.
    ///
    /// The pronoun is substituted first since candidate masking introduces
    /// underscores of its own.
    pub fn masked_sentence(&self, pronoun: &str) -> String {
        let mut sentence = self.sentence.replace('_', pronoun);
        for candidate in [&self.candidate1, &self.candidate2] {
            let words: Vec<&str> = candidate.split_whitespace().collect();
            if words.len() > 1 {
                sentence = sentence.replace(&words.join(" "), &words.join("_"));
            }
        }
        sentence
    }

    /// Masked sentence with both candidates blanked, for similarity search.
    pub fn retrieval_sentence(&self, pronoun: &str) -> String {
        let mut sentence = self.masked_sentence(pronoun);
        for candidate in [&self.candidate1, &self.candidate2] {
            let joined = candidate.split_whitespace().collect::<Vec<_>>().join("_");
            if !joined.is_empty() {
                sentence = sentence.replace(&joined, CANDIDATE_MASK);
            }
        }
        sentence
    }
}

/// Lower-case, underscore-joined single-token form of a candidate phrase.
pub fn candidate_atom(candidate: &str) -> String {
    candidate
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether `word` (a predicate argument) refers to `candidate`.
///
/// Matches the joined form (`the_man`) or any single word of the phrase (`man`).
pub fn mentions(candidate: &str, word: &str) -> bool {
    let word = word.to_lowercase();
    candidate_atom(candidate) == word
        || candidate
            .split_whitespace()
            .any(|w| w.to_lowercase() == word)
}

/// Pick the argument that stands for `candidate`, preferring an exact
/// match on the joined form over a single-word match.
pub fn resolve_candidate<'a, I>(candidate: &str, args: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let args = args.into_iter();
    let joined = candidate_atom(candidate);
    args.clone()
        .find(|a| *a == joined)
        .or_else(|| args.clone().find(|a| mentions(candidate, a)))
}

// ---------------------------------------------------------------------------
// Corpus loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnswerField {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ProblemRecord {
    sentence: String,
    option1: String,
    option2: String,
    answer: AnswerField,
}

impl TryFrom<ProblemRecord> for WscProblem {
    type Error = CorpusError;

    fn try_from(record: ProblemRecord) -> Result<Self, Self::Error> {
        let raw = match record.answer {
            AnswerField::Number(n) => n.to_string(),
            AnswerField::Text(s) => s.trim().to_string(),
        };
        let answer = raw
            .parse::<u8>()
            .ok()
            .and_then(Answer::from_index)
            .ok_or(CorpusError::InvalidAnswer { answer: raw })?;
        Ok(WscProblem::new(
            record.sentence,
            record.option1,
            record.option2,
            answer,
        ))
    }
}

/// Parse one JSON line of the corpus format.
pub fn parse_problem(line: &str) -> Result<WscProblem, String> {
    let record: ProblemRecord = serde_json::from_str(line).map_err(|e| e.to_string())?;
    WscProblem::try_from(record).map_err(|e| e.to_string())
}

/// Load a JSONL corpus of `{sentence, option1, option2, answer}` records.
///
/// Blank lines are skipped.
pub fn load_corpus(path: &Path) -> Result<Vec<WscProblem>, CorpusError> {
    let file = std::fs::File::open(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut problems = Vec::new();
    for (i, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| CorpusError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let problem = parse_problem(&line).map_err(|message| CorpusError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            message,
        })?;
        problems.push(problem);
    }
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lift() -> WscProblem {
        WscProblem::new(
            "The man couldn't lift his son because _ was so weak.",
            "The man",
            "The son",
            Answer::First,
        )
    }

    #[test]
    fn masks_pronoun_then_candidates() {
        let masked = lift().masked_sentence(PRONOUN_SYMBOL);
        assert_eq!(
            masked,
            "The_man couldn't lift his son because target_pronoun was so weak."
        );
    }

    #[test]
    fn retrieval_form_blanks_candidates() {
        let problem = WscProblem::new(
            "The cat ate the rat because _ was hungry",
            "cat",
            "rat",
            Answer::First,
        );
        assert_eq!(
            problem.retrieval_sentence(PRONOUN_SYMBOL),
            "The candidate ate the candidate because target_pronoun was hungry"
        );
    }

    #[test]
    fn correct_and_incorrect_follow_answer() {
        let p = lift();
        assert_eq!(p.correct_candidate(), "The man");
        assert_eq!(p.incorrect_candidate(), "The son");
        let q = WscProblem::new("s", "a", "b", Answer::Second);
        assert_eq!(q.correct_candidate(), "b");
        assert_eq!(q.incorrect_candidate(), "a");
    }

    #[test]
    fn candidate_matching() {
        assert_eq!(candidate_atom("The Man"), "the_man");
        assert!(mentions("The man", "man"));
        assert!(mentions("The man", "the_man"));
        assert!(!mentions("The man", "son"));

        let args = ["lift", "man", "the_man"];
        assert_eq!(resolve_candidate("The man", args), Some("the_man"));
        assert_eq!(resolve_candidate("man", ["lift", "man"]), Some("man"));
        assert_eq!(resolve_candidate("The dog", args), None);
    }

    #[test]
    fn parses_string_and_numeric_answers() {
        let a = parse_problem(r#"{"sentence":"s _","option1":"a","option2":"b","answer":"2"}"#)
            .unwrap();
        assert_eq!(a.answer(), Answer::Second);
        let b = parse_problem(r#"{"sentence":"s _","option1":"a","option2":"b","answer":1,"qID":"x"}"#)
            .unwrap();
        assert_eq!(b.answer(), Answer::First);
        assert!(parse_problem(r#"{"sentence":"s","option1":"a","option2":"b","answer":"3"}"#).is_err());
    }

    #[test]
    fn loads_corpus_skipping_blank_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("train.jsonl");
        std::fs::write(
            &path,
            "{\"sentence\":\"A _\",\"option1\":\"x\",\"option2\":\"y\",\"answer\":\"1\"}\n\n\
             {\"sentence\":\"B _\",\"option1\":\"x\",\"option2\":\"y\",\"answer\":\"2\"}\n",
        )
        .unwrap();
        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[1].answer(), Answer::Second);
    }

    #[test]
    fn reports_line_of_bad_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"sentence\":\"A\"}\n").unwrap();
        assert!(matches!(
            load_corpus(&path),
            Err(CorpusError::Parse { line: 1, .. })
        ));
    }
}
