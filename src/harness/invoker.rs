//! Checker invocation.
//!
//! The checker is an opaque external program. It is launched as
//!
//! ```text
//! <checker> <config_path> <task> <salt> <log_path>
//! ```
//!
//! and its stdout is scanned for the `Result code:` and `Code string:` markers. Everything it prints is kept for
//! diagnostics.
//!
//! ## Design
//!
//! Invocation sits behind the [`Checker`] trait so the runner can be exercised without spawning processes.
//! [`ProcessChecker`] is the real implementation. It drains stdout and stderr on their own threads so a checker that
//! writes a lot to one stream cannot block on a full pipe while we wait on the other, and it optionally enforces a
//! [`WaitPolicy::Timeout`]. The timeout covers the output streams too: a process the checker left behind may keep
//! the pipes open after the checker itself is gone, so under a timeout the readers are abandoned at the deadline
//! instead of joined.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use logcheck_core::protocol::{self, Marker, Salt};
use thiserror::Error;

/// Poll interval while waiting on a checker under a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to keep collecting output after a timed-out checker was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 8 * 1024;

/// Arguments of one checker invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub config_path: &'a Path,
    pub task: &'a str,
    pub salt: Salt,
    pub log_path: &'a Path,
}

/// Raw text captured from a checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Every stdout line, trimmed, newline-terminated.
    pub stdout: String,
    pub stderr: String,
}

/// What one checker invocation reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Value of the last `Result code:` line, if any.
    pub result: Option<i64>,
    /// Value of the last `Code string:` line, if any.
    pub proof: Option<String>,
    pub output: CapturedOutput,
    /// Process exit code. Informational only; the verdict comes from stdout.
    pub exit_code: Option<i32>,
}

/// How long to wait for a checker to exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Block until the checker exits and closes its streams.
    #[default]
    Unbounded,
    /// Kill the checker once this much time has passed.
    Timeout(Duration),
}

/// Errors that prevent an invocation from producing an outcome.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("failed to launch checker '{}': {source}", .checker.display())]
    Spawn {
        checker: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for checker: {0}")]
    Wait(#[source] std::io::Error),

    #[error("checker did not finish within {}s and was killed", .timeout.as_secs_f64())]
    TimedOut { timeout: Duration, output: CapturedOutput },

    #[error("checker printed a non-integer result code '{value}'")]
    MalformedResult { value: String, output: CapturedOutput },
}

impl InvokeError {
    /// Output captured before the failure, when there was any.
    pub fn captured(&self) -> Option<&CapturedOutput> {
        match self {
            InvokeError::TimedOut { output, .. } | InvokeError::MalformedResult { output, .. } => Some(output),
            InvokeError::Spawn { .. } | InvokeError::Wait(_) => None,
        }
    }
}

/// Something that can evaluate a log file for a task.
pub trait Checker {
    fn invoke(&mut self, invocation: &Invocation<'_>) -> Result<InvocationOutcome, InvokeError>;
}

impl<C: Checker + ?Sized> Checker for &mut C {
    fn invoke(&mut self, invocation: &Invocation<'_>) -> Result<InvocationOutcome, InvokeError> {
        (**self).invoke(invocation)
    }
}

/// Markers extracted from checker stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedStdout {
    pub result: Option<i64>,
    pub proof: Option<String>,
    /// Normalized copy of stdout for diagnostics.
    pub text: String,
}

/// A `Result code:` line that did not carry an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedResult {
    /// The offending remainder, trimmed.
    pub value: String,
    /// Normalized copy of stdout for diagnostics.
    pub text: String,
}

/// Scan checker stdout for the protocol markers.
///
/// Lines are trimmed before matching; the last occurrence of each marker wins.
pub fn parse_stdout(stdout: &str) -> Result<ParsedStdout, MalformedResult> {
    let mut parsed = ParsedStdout::default();
    let mut malformed = None;

    for raw in stdout.lines() {
        let line = raw.trim();
        parsed.text.push_str(line);
        parsed.text.push('\n');

        match protocol::match_marker(line) {
            Some((Marker::ResultCode, rest)) => {
                let rest = rest.trim();
                match rest.parse::<i64>() {
                    Ok(value) => {
                        parsed.result = Some(value);
                        malformed = None;
                    }
                    Err(_) => {
                        parsed.result = None;
                        malformed = Some(rest.to_string());
                    }
                }
            }
            Some((Marker::ProofCode, rest)) => parsed.proof = Some(rest.trim().to_string()),
            None => {}
        }
    }

    match malformed {
        Some(value) => Err(MalformedResult {
            value,
            text: parsed.text,
        }),
        None => Ok(parsed),
    }
}

/// Runs the checker as a child process.
#[derive(Debug, Clone)]
pub struct ProcessChecker {
    program: PathBuf,
    wait: WaitPolicy,
}

impl ProcessChecker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    fn spawn(&self, invocation: &Invocation<'_>) -> Result<Child, InvokeError> {
        Command::new(&self.program)
            .arg(invocation.config_path)
            .arg(invocation.task)
            .arg(invocation.salt.to_string())
            .arg(invocation.log_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InvokeError::Spawn {
                checker: self.program.clone(),
                source,
            })
    }
}

impl Checker for ProcessChecker {
    fn invoke(&mut self, invocation: &Invocation<'_>) -> Result<InvocationOutcome, InvokeError> {
        tracing::debug!(
            checker = %self.program.display(),
            task = invocation.task,
            salt = invocation.salt.get(),
            log = %invocation.log_path.display(),
            "invoking checker"
        );

        let timeout = match self.wait {
            WaitPolicy::Unbounded => None,
            WaitPolicy::Timeout(timeout) => Some(timeout),
        };
        let started = Instant::now();
        let mut child = self.spawn(invocation)?;

        let (tx, rx) = mpsc::channel();
        drain(child.stdout.take(), Stream::Stdout, &tx);
        drain(child.stderr.take(), Stream::Stderr, &tx);
        drop(tx);

        let waited = wait_for(&mut child, timeout.map(|t| started + t)).map_err(InvokeError::Wait)?;
        // Output gets whatever is left of the budget, or a short grace after a kill.
        let collected = collect(rx, timeout.map(|t| (started + t).max(Instant::now() + DRAIN_GRACE)));

        let exit_code = match waited {
            Waited::Exited(status) => status.code(),
            Waited::TimedOut => None,
        };
        let timed_out = matches!(waited, Waited::TimedOut) || !collected.complete;

        if let Some(timeout) = timeout.filter(|_| timed_out) {
            if collected.complete {
                tracing::warn!(task = invocation.task, ?timeout, "checker timed out");
            } else {
                tracing::warn!(task = invocation.task, ?timeout, "checker output still open at deadline, abandoning it");
            }
            let stdout = parse_stdout(&collected.stdout).map_or_else(|m| m.text, |p| p.text);
            return Err(InvokeError::TimedOut {
                timeout,
                output: CapturedOutput {
                    stdout,
                    stderr: collected.stderr,
                },
            });
        }

        match parse_stdout(&collected.stdout) {
            Ok(parsed) => Ok(InvocationOutcome {
                result: parsed.result,
                proof: parsed.proof,
                output: CapturedOutput {
                    stdout: parsed.text,
                    stderr: collected.stderr,
                },
                exit_code,
            }),
            Err(MalformedResult { value, text }) => Err(InvokeError::MalformedResult {
                value,
                output: CapturedOutput {
                    stdout: text,
                    stderr: collected.stderr,
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Forward a child stream to `tx` in chunks from a background thread. The thread is never joined; it ends at EOF or
/// once the receiver is gone.
fn drain<R: Read + Send + 'static>(stream: Option<R>, which: Stream, tx: &Sender<(Stream, Vec<u8>)>) {
    let Some(mut stream) = stream else {
        return;
    };
    let tx = tx.clone();
    thread::spawn(move || {
        let mut buf = vec![0; READ_CHUNK];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((which, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!(stream = ?which, error = %e, "reading checker output failed");
                    break;
                }
            }
        }
    });
}

/// Output gathered from both streams.
struct Collected {
    stdout: String,
    stderr: String,
    /// Both streams reached EOF before the deadline.
    complete: bool,
}

fn collect(rx: Receiver<(Stream, Vec<u8>)>, deadline: Option<Instant>) -> Collected {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let complete = loop {
        let received = match deadline {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
        };
        match received {
            Ok((Stream::Stdout, chunk)) => stdout.extend_from_slice(&chunk),
            Ok((Stream::Stderr, chunk)) => stderr.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break true,
            Err(RecvTimeoutError::Timeout) => break false,
        }
    };
    Collected {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        complete,
    }
}

#[derive(Debug, Clone, Copy)]
enum Waited {
    Exited(ExitStatus),
    TimedOut,
}

/// Wait for the child, up to `deadline` if there is one. On expiry the child is killed and reaped.
fn wait_for(child: &mut Child, deadline: Option<Instant>) -> io::Result<Waited> {
    let Some(deadline) = deadline else {
        return child.wait().map(Waited::Exited);
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Waited::Exited(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(Waited::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
