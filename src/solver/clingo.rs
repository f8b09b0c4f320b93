//! clingo as the answer-set solver.
//!
//! The program goes in on stdin; all models are requested (`-n 0`) in JSON
//! form (`--outf=2`).

use std::process::Command;
use std::time::Duration;

use serde::Deserialize;

use crate::atom::Atom;
use crate::error::SolverError;

use super::process::{self, ProcessOutcome};
use super::{AnswerSetSolver, Model};

/// clingo exit codes for satisfiable, unsatisfiable and exhausted searches.
const SUCCESS_CODES: [i32; 3] = [10, 20, 30];

/// Runs the clingo binary as a subprocess.
#[derive(Debug, Clone)]
pub struct ClingoSolver {
    binary: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ClingoSolver {
    pub fn new(binary: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            args,
            timeout,
        }
    }
}

impl AnswerSetSolver for ClingoSolver {
    fn solve(&self, program: &str) -> Result<Vec<Model>, SolverError> {
        let mut command = Command::new(&self.binary);
        command.args(&self.args).args(["--outf=2", "-n", "0"]);

        let outcome = process::run(&mut command, Some(program), self.timeout).map_err(|source| {
            SolverError::Spawn {
                binary: self.binary.clone(),
                source,
            }
        })?;

        let done = match outcome {
            ProcessOutcome::Completed(done) => done,
            ProcessOutcome::TimedOut { after } => {
                return Err(SolverError::Timeout {
                    secs: after.as_secs(),
                });
            }
        };

        if !SUCCESS_CODES.contains(&done.code()) {
            let message = if done.stderr.trim().is_empty() {
                done.stdout.trim().to_string()
            } else {
                done.stderr.trim().to_string()
            };
            return Err(SolverError::Runtime { message });
        }

        parse_output(&done.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct Output {
    #[serde(rename = "Result")]
    result: String,
    #[serde(rename = "Call", default)]
    calls: Vec<Call>,
}

#[derive(Debug, Deserialize)]
struct Call {
    #[serde(rename = "Witnesses", default)]
    witnesses: Vec<Witness>,
}

#[derive(Debug, Deserialize)]
struct Witness {
    #[serde(rename = "Value", default)]
    value: Vec<String>,
}

/// Parse clingo's JSON report into models.
///
/// An unsatisfiable program yields no models.
pub fn parse_output(json: &str) -> Result<Vec<Model>, SolverError> {
    let output: Output = serde_json::from_str(json).map_err(|e| SolverError::Output {
        message: e.to_string(),
    })?;

    if output.result == "UNSATISFIABLE" {
        return Ok(Vec::new());
    }

    output
        .calls
        .into_iter()
        .flat_map(|call| call.witnesses)
        .map(|witness| {
            witness
                .value
                .iter()
                .map(|text| Atom::parse(text))
                .collect::<Result<Vec<_>, _>>()
                .map(Model::new)
                .map_err(|e| SolverError::Output {
                    message: e.to_string(),
                })
        })
        .collect()
}
