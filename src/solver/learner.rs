//! The external inductive learner.

use std::io::Write;
use std::process::Command;
use std::time::Duration;

use crate::error::BuildError;

use super::process::{self, ProcessOutcome};

/// Marker the learner prints when no hypothesis covers the examples.
const UNSATISFIABLE: &str = "UNSATISFIABLE";

/// Learns rules from a serialized learning task.
///
/// Returns the learned rule text, empty when nothing was learned.
pub trait InductiveLearner: Send + Sync {
    fn learn(&self, task: &str) -> Result<String, BuildError>;
}

/// Runs an ILASP-compatible learner binary on a temporary task file.
#[derive(Debug, Clone)]
pub struct IlaspLearner {
    binary: String,
    args: Vec<String>,
    timeout: Duration,
}

impl IlaspLearner {
    pub fn new(binary: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            args,
            timeout,
        }
    }
}

impl InductiveLearner for IlaspLearner {
    fn learn(&self, task: &str) -> Result<String, BuildError> {
        // Removed when dropped, on every return path below.
        let mut file = tempfile::Builder::new()
            .prefix("wsc-task-")
            .suffix(".las")
            .tempfile()
            .map_err(|source| BuildError::TempFile { source })?;
        file.write_all(task.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| BuildError::TempFile { source })?;

        let mut command = Command::new(&self.binary);
        command.args(&self.args).arg(file.path());

        tracing::debug!(
            binary = %self.binary,
            task = %file.path().display(),
            timeout_secs = self.timeout.as_secs(),
            "running learner"
        );

        let outcome = process::run(&mut command, None, Some(self.timeout)).map_err(|source| {
            BuildError::LearnerSpawn {
                binary: self.binary.clone(),
                source,
            }
        })?;

        match outcome {
            ProcessOutcome::TimedOut { after } => {
                tracing::warn!(
                    elapsed_secs = after.as_secs(),
                    "learner timed out, continuing with no learned rules"
                );
                Ok(String::new())
            }
            ProcessOutcome::Completed(done) if done.stdout.contains(UNSATISFIABLE) => {
                tracing::info!("learning task is unsatisfiable, no rules learned");
                Ok(String::new())
            }
            ProcessOutcome::Completed(done) if !done.status.success() => {
                Err(BuildError::LearnerFailed {
                    status: done.code(),
                    stderr: done.stderr.trim().to_string(),
                })
            }
            ProcessOutcome::Completed(done) => Ok(done.stdout),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Instant;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, format!("{body}\n")).unwrap();
        path
    }

    /// The script runs under `/bin/sh`; the task file follows it as `$1`.
    fn learner(script: &Path, timeout: Duration) -> IlaspLearner {
        IlaspLearner::new("/bin/sh", vec![script.to_string_lossy().into_owned()], timeout)
    }

    #[test]
    fn returns_learned_text() {
        let dir = TempDir::new().unwrap();
        let bin = script(&dir, "learner", "echo 'coref(target_pronoun, V1) :- property(weak, V1).'");
        let learned = learner(&bin, Duration::from_secs(10)).learn("#pos(p0, {}, {}).").unwrap();
        assert_eq!(learned.trim(), "coref(target_pronoun, V1) :- property(weak, V1).");
    }

    #[test]
    fn task_file_is_passed_last_and_removed() {
        let dir = TempDir::new().unwrap();
        let record = dir.path().join("seen");
        // Print the task path and its contents.
        let bin = script(
            &dir,
            "learner",
            &format!("echo \"$1\" > {0}; cat \"$1\" >> {0}", record.display()),
        );
        learner(&bin, Duration::from_secs(10)).learn("task body").unwrap();

        let seen = std::fs::read_to_string(&record).unwrap();
        let mut lines = seen.lines();
        let task_path = PathBuf::from(lines.next().unwrap());
        assert_eq!(lines.next(), Some("task body"));
        assert!(!task_path.exists());
    }

    #[test]
    fn unsatisfiable_is_empty() {
        let dir = TempDir::new().unwrap();
        let bin = script(&dir, "learner", "echo UNSATISFIABLE");
        let learned = learner(&bin, Duration::from_secs(10)).learn("").unwrap();
        assert!(learned.is_empty());
    }

    #[test]
    fn timeout_is_empty_and_bounded() {
        let dir = TempDir::new().unwrap();
        let bin = script(&dir, "learner", "sleep 1000");
        let started = Instant::now();
        let learned = learner(&bin, Duration::from_millis(500)).learn("").unwrap();
        assert!(learned.is_empty());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn background_child_does_not_outlive_the_learner() {
        let dir = TempDir::new().unwrap();
        let bin = script(
            &dir,
            "learner",
            "echo 'coref(target_pronoun, V1) :- property(weak, V1).'; sleep 20 &",
        );
        let started = Instant::now();
        let learned = learner(&bin, Duration::from_secs(2)).learn("").unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(learned.trim(), "coref(target_pronoun, V1) :- property(weak, V1).");
    }

    #[test]
    fn failure_reports_status() {
        let dir = TempDir::new().unwrap();
        let bin = script(&dir, "learner", "echo 'bad mode' >&2; exit 2");
        let err = learner(&bin, Duration::from_secs(10)).learn("").unwrap_err();
        assert!(matches!(err, BuildError::LearnerFailed { status: 2, .. }));
    }

    #[test]
    fn missing_binary_fails_to_spawn() {
        let err = IlaspLearner::new("/nonexistent/ILASP", Vec::new(), Duration::from_secs(1))
            .learn("")
            .unwrap_err();
        assert!(matches!(err, BuildError::LearnerSpawn { .. }));
    }
}
