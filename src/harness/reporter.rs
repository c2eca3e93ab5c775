//! Run reporting.
//!
//! The runner never prints. It emits lifecycle events through the [`Reporter`] trait, which keeps output format
//! separate from execution. Two implementations ship:
//!
//! - [`ConsoleReporter`]: human-readable progress and failure diagnostics.
//! - [`JsonReporter`]: one JSON object per event, for CI pipelines.
//!
//! Neither ever sees the shared secret.

use std::io::{self, Write};
use std::time::Duration;

use logcheck_core::protocol::Salt;
use serde_json::{Value, json};

use super::catalog::TestCase;
use super::runner::{CaseFailure, Failure, RunSummary};

/// Receives run lifecycle events.
pub trait Reporter {
    /// Called once the catalog is loaded, before any case runs.
    fn on_collection_complete(&mut self, case_count: usize);

    /// Called right before a case's checker is launched.
    fn on_case_start(&mut self, case: &TestCase, salt: Salt);

    fn on_case_passed(&mut self, case: &TestCase, duration: Duration);

    /// Called for the (single) failing case; the run ends right after.
    fn on_case_failed(&mut self, failure: &CaseFailure);

    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// One-line description of a failure, without captured output.
pub fn describe_failure(failure: &CaseFailure) -> String {
    let log = failure.case.log_path.display();
    match &failure.failure {
        Failure::MissingResult => format!(
            "No result code reported (expected {}) while testing log {}",
            failure.case.expected_result, log
        ),
        Failure::ResultMismatch { expected, actual } => {
            format!("Wrong result {actual} (expected {expected}) while testing log {log}")
        }
        Failure::ProofMismatch { expected, actual } => format!(
            "Wrong result code '{}' (expected '{}') while testing log {}",
            actual.as_deref().unwrap_or("<none>"),
            expected,
            log
        ),
        Failure::Invoke(err) => format!("Checker error while testing log {log}: {err}"),
    }
}

// ============================================================================
// Console
// ============================================================================

/// Default console reporter.
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    pub verbose: bool,
    pub color: bool,
}

impl ConsoleReporter {
    pub fn stdout(verbose: bool, color: bool) -> Self {
        Self::new(io::stdout(), verbose, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_collection_complete(&mut self, case_count: usize) {
        let _ = writeln!(self.out, "Testing (total {case_count}):");
    }

    fn on_case_start(&mut self, case: &TestCase, salt: Salt) {
        let _ = write!(
            self.out,
            "Running checker {} {} with salt {}... ",
            case.task,
            case.log_path.display(),
            salt
        );
        let _ = self.out.flush();
    }

    fn on_case_passed(&mut self, _case: &TestCase, duration: Duration) {
        let ok = self.paint("32", "OK");
        if self.verbose {
            let _ = writeln!(self.out, "{ok} ({}ms)", duration.as_millis());
        } else {
            let _ = writeln!(self.out, "{ok}");
        }
    }

    fn on_case_failed(&mut self, failure: &CaseFailure) {
        let headline = self.paint("31", &describe_failure(failure));
        let _ = writeln!(self.out, "{headline}");
        if self.verbose {
            let _ = writeln!(
                self.out,
                "  (catalog line {}, salt {})",
                failure.case.line, failure.salt
            );
        }
        if let Some(code) = failure.exit_code {
            let _ = writeln!(self.out, "Exit code: {code}");
        }
        if let Some(output) = &failure.output {
            let _ = writeln!(self.out, "Errors:\n{}\n", output.stderr);
            let _ = writeln!(self.out, "Output:\n{}\n", output.stdout);
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if !summary.aborted {
            let _ = writeln!(self.out, "Done!");
        }
        if self.verbose {
            let _ = writeln!(
                self.out,
                "{} of {} passed in {:.2}s",
                summary.passed,
                summary.total,
                summary.duration.as_secs_f64()
            );
        }
        let _ = self.out.flush();
    }
}

// ============================================================================
// JSON lines
// ============================================================================

/// Writes one JSON object per event, one per line.
pub struct JsonReporter<W: Write = io::Stdout> {
    out: W,
}

impl JsonReporter {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: Value) {
        let _ = writeln!(self.out, "{event}");
        let _ = self.out.flush();
    }
}

fn failure_details(failure: &Failure) -> Value {
    match failure {
        Failure::MissingResult => json!({}),
        Failure::ResultMismatch { expected, actual } => json!({ "expected": expected, "actual": actual }),
        Failure::ProofMismatch { expected, actual } => json!({ "expected": expected.as_str(), "actual": actual }),
        Failure::Invoke(err) => json!({ "error": err.to_string() }),
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn on_collection_complete(&mut self, case_count: usize) {
        self.emit(json!({ "event": "collected", "total": case_count }));
    }

    fn on_case_start(&mut self, case: &TestCase, salt: Salt) {
        self.emit(json!({
            "event": "case_started",
            "task": case.task,
            "log": case.log_path.display().to_string(),
            "salt": salt.get(),
        }));
    }

    fn on_case_passed(&mut self, case: &TestCase, duration: Duration) {
        self.emit(json!({
            "event": "case_passed",
            "task": case.task,
            "log": case.log_path.display().to_string(),
            "duration_ms": duration.as_millis() as u64,
        }));
    }

    fn on_case_failed(&mut self, failure: &CaseFailure) {
        let (stdout, stderr) = match &failure.output {
            Some(output) => (Some(output.stdout.as_str()), Some(output.stderr.as_str())),
            None => (None, None),
        };
        self.emit(json!({
            "event": "case_failed",
            "task": failure.case.task,
            "log": failure.case.log_path.display().to_string(),
            "line": failure.case.line,
            "salt": failure.salt.get(),
            "kind": failure.failure.kind(),
            "exit_code": failure.exit_code,
            "message": describe_failure(failure),
            "details": failure_details(&failure.failure),
            "stdout": stdout,
            "stderr": stderr,
        }));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(json!({
            "event": "run_complete",
            "status": if summary.aborted { "aborted" } else { "all_passed" },
            "total": summary.total,
            "passed": summary.passed,
            "duration_ms": summary.duration.as_millis() as u64,
        }));
    }
}

// ============================================================================
// Test support
// ============================================================================

/// Records events as short strings.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingReporter {
    pub events: Vec<String>,
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn on_collection_complete(&mut self, case_count: usize) {
        self.events.push(format!("collected {case_count}"));
    }

    fn on_case_start(&mut self, case: &TestCase, salt: Salt) {
        self.events.push(format!("start {} {}", case.task, salt));
    }

    fn on_case_passed(&mut self, case: &TestCase, _duration: Duration) {
        self.events.push(format!("pass {}", case.task));
    }

    fn on_case_failed(&mut self, failure: &CaseFailure) {
        self.events
            .push(format!("fail {} {}", failure.case.task, failure.failure.kind()));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        let status = if summary.aborted { "aborted" } else { "done" };
        self.events
            .push(format!("{status} {}/{}", summary.passed, summary.total));
    }
}
