//! Bounded-time subprocess execution.
//!
//! The child runs in its own process group. On timeout the whole group is
//! interrupted, then killed if it is still alive after a grace period, so
//! helpers spawned by the child do not outlive it. When the child exits on
//! its own, anything left in its group is killed before output is collected.
//! Output is drained on reader threads so a chatty child never blocks on a
//! full pipe.

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

/// Interval between `try_wait` polls.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Time a process group gets to exit after the interrupt before it is killed.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// A process that exited on its own.
#[derive(Debug)]
pub struct CompletedProcess {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CompletedProcess {
    /// Exit code, or -1 if the process was terminated by a signal.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// How a bounded run ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    Completed(CompletedProcess),
    /// The deadline passed; the process group was cancelled and its output discarded.
    TimedOut { after: Duration },
}

/// Run `command` to completion, feeding `stdin` and capturing output.
///
/// With `timeout = None` the call blocks until the process exits. Spawn and
/// wait failures are returned as I/O errors.
pub fn run(
    command: &mut Command,
    stdin: Option<&str>,
    timeout: Option<Duration>,
) -> std::io::Result<ProcessOutcome> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn()?;
    let started = Instant::now();

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.to_string();
        // Detached: a child that exits without reading its input closes the
        // pipe, and a descendant that inherited it is killed with the group.
        std::thread::spawn(move || {
            let _ = pipe.write_all(input.as_bytes());
        });
    }
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = timeout.map(|t| started + t);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    cancel_group(&mut child);
                    let after = started.elapsed();
                    tracing::warn!(
                        pid = child.id(),
                        elapsed_ms = after.as_millis() as u64,
                        "subprocess timed out, process group cancelled"
                    );
                    return Ok(ProcessOutcome::TimedOut { after });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                cancel_group(&mut child);
                return Err(e);
            }
        }
    };

    // Descendants left behind by the leader would hold the output pipes open.
    reap_group(&child);

    let drain_deadline = deadline.map(|d| d.max(Instant::now() + KILL_GRACE));
    Ok(ProcessOutcome::Completed(CompletedProcess {
        status,
        stdout: collect(stdout, drain_deadline),
        stderr: collect(stderr, drain_deadline),
    }))
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Output read by a drain thread, waiting no later than `deadline`.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    let bytes = match deadline {
        Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())).ok(),
        None => rx.recv().ok(),
    };
    bytes
        .map(|b| String::from_utf8_lossy(&b).into_owned())
        .unwrap_or_default()
}

/// Kill whatever is left of the group of a leader that already exited.
#[cfg(unix)]
fn reap_group(child: &Child) {
    // Safety: killpg only sends a signal; an empty group yields ESRCH.
    unsafe {
        libc::killpg(child.id() as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn reap_group(_child: &Child) {}

/// Interrupt the child's process group, escalating to a kill after [`KILL_GRACE`].
#[cfg(unix)]
fn cancel_group(child: &mut Child) {
    // The child was spawned with `process_group(0)`: its pid is the group id.
    let pgid = child.id() as libc::pid_t;

    // Safety: killpg only sends a signal; a stale group id yields ESRCH.
    unsafe {
        libc::killpg(pgid, libc::SIGINT);
    }

    let grace = Instant::now() + KILL_GRACE;
    while Instant::now() < grace {
        if let Ok(Some(_)) = child.try_wait() {
            // The leader is gone; make sure no descendant survives it.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn cancel_group(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
