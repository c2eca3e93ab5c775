//! The verification loop.
//!
//! For every catalog case, in order:
//!
//! 1. draw a fresh salt,
//! 2. invoke the checker,
//! 3. require a result code equal to the expected one,
//! 4. for a nonzero result, require the proof code derived from the shared secret.
//!
//! The first failing case aborts the run; nothing after it executes.
//!
//! ## Design
//!
//! Everything the loop needs is passed in: the [`RunPlan`] (secret, cases, config path), a [`Checker`], a
//! [`SaltSource`] and a [`Reporter`]. There is no ambient state, so the loop is driven by fakes in tests and a real
//! process checker from the CLI.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use logcheck_core::proof::{ProofCode, derive_proof, verify_proof};
use logcheck_core::protocol::{SALT_MAX, SALT_MIN, Salt};
use rand::Rng;
use rand::rngs::ThreadRng;

use super::catalog::{TestCase, load_catalog};
use super::config::{Secret, load_secret};
use super::errors::HarnessError;
use super::invoker::{CapturedOutput, Checker, Invocation, InvocationOutcome, InvokeError, ProcessChecker};
use super::options::RunOptions;
use super::reporter::Reporter;

// ============================================================================
// Salt sources
// ============================================================================

/// Supplies one salt per invocation.
pub trait SaltSource {
    fn next_salt(&mut self) -> Salt;
}

/// Uniform salts from a random number generator (thread-local by default).
pub struct RandomSalt<R = ThreadRng> {
    rng: R,
}

impl RandomSalt {
    pub fn new() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl Default for RandomSalt {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSalt<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SaltSource for RandomSalt<R> {
    fn next_salt(&mut self) -> Salt {
        Salt::saturating(self.rng.gen_range(SALT_MIN..=SALT_MAX))
    }
}

// ============================================================================
// Run plan
// ============================================================================

/// Everything resolved before the first case runs.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub secret: Secret,
    /// Passed through to the checker verbatim.
    pub config_path: PathBuf,
    pub cases: Vec<TestCase>,
}

impl RunPlan {
    /// Resolve the secret, then the catalog. A missing secret fails before the catalog is even read.
    pub fn load(config_path: &Path, catalog_path: &Path) -> Result<Self, HarnessError> {
        let secret = load_secret(config_path)?;
        let cases = load_catalog(catalog_path)?;
        tracing::info!(
            config = %config_path.display(),
            catalog = %catalog_path.display(),
            cases = cases.len(),
            "loaded run plan"
        );
        Ok(Self {
            secret,
            config_path: config_path.to_path_buf(),
            cases,
        })
    }
}

// ============================================================================
// Verdicts
// ============================================================================

/// Lifecycle of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Pending,
    Running,
    Passed,
    Failed,
}

/// Why a case failed.
#[derive(Debug)]
pub enum Failure {
    /// The checker printed no `Result code:` line at all.
    MissingResult,
    ResultMismatch { expected: i64, actual: i64 },
    /// `actual` is `None` when the checker printed no `Code string:` line.
    ProofMismatch { expected: ProofCode, actual: Option<String> },
    Invoke(InvokeError),
}

impl Failure {
    /// Stable identifier for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::MissingResult => "missing_result",
            Failure::ResultMismatch { .. } => "result_mismatch",
            Failure::ProofMismatch { .. } => "proof_mismatch",
            Failure::Invoke(InvokeError::TimedOut { .. }) => "timed_out",
            Failure::Invoke(InvokeError::MalformedResult { .. }) => "malformed_result",
            Failure::Invoke(_) => "invoke_error",
        }
    }
}

/// A failed case with everything needed to diagnose it.
#[derive(Debug)]
pub struct CaseFailure {
    pub case: TestCase,
    pub salt: Salt,
    pub failure: Failure,
    /// Checker output, when the checker got far enough to produce any.
    pub output: Option<CapturedOutput>,
    /// Checker exit code, when it exited on its own.
    pub exit_code: Option<i32>,
}

/// Overall result of a run.
#[derive(Debug)]
pub enum RunOutcome {
    AllPassed { passed: usize },
    Aborted { passed: usize, failure: Box<CaseFailure> },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::AllPassed { .. })
    }

    pub fn passed(&self) -> usize {
        match self {
            RunOutcome::AllPassed { passed } | RunOutcome::Aborted { passed, .. } => *passed,
        }
    }
}

/// Totals handed to [`Reporter::on_run_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub aborted: bool,
    pub duration: Duration,
}

/// Judge one checker outcome against its case.
///
/// Proof verification happens only when the result matched and is nonzero. A zero verdict carries no proof, and
/// whatever the checker printed as one is ignored.
pub fn evaluate(secret: &Secret, case: &TestCase, salt: Salt, outcome: &InvocationOutcome) -> Result<(), Failure> {
    let Some(actual) = outcome.result else {
        return Err(Failure::MissingResult);
    };
    if actual != case.expected_result {
        return Err(Failure::ResultMismatch {
            expected: case.expected_result,
            actual,
        });
    }
    if actual == 0 {
        return Ok(());
    }

    match outcome.proof.as_deref() {
        Some(reported) if verify_proof(secret.expose(), &case.task, salt, actual, reported) => Ok(()),
        reported => Err(Failure::ProofMismatch {
            expected: derive_proof(secret.expose(), &case.task, salt, actual),
            actual: reported.map(str::to_string),
        }),
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Drives a checker over a run plan.
pub struct TestRunner<'a, C, S> {
    plan: &'a RunPlan,
    checker: C,
    salts: S,
    states: Vec<CaseState>,
}

impl<'a, C: Checker, S: SaltSource> TestRunner<'a, C, S> {
    pub fn new(plan: &'a RunPlan, checker: C, salts: S) -> Self {
        Self {
            plan,
            checker,
            salts,
            states: vec![CaseState::Pending; plan.cases.len()],
        }
    }

    /// Per-case state, in catalog order.
    pub fn states(&self) -> &[CaseState] {
        &self.states
    }

    /// Run every case in order, stopping at the first failure.
    pub fn run(&mut self, reporter: &mut dyn Reporter) -> RunOutcome {
        let start = Instant::now();
        let total = self.plan.cases.len();
        reporter.on_collection_complete(total);

        let mut passed = 0;
        for idx in 0..total {
            match self.run_case(idx, reporter) {
                Ok(()) => passed += 1,
                Err(failure) => {
                    reporter.on_case_failed(&failure);
                    reporter.on_run_complete(&RunSummary {
                        total,
                        passed,
                        aborted: true,
                        duration: start.elapsed(),
                    });
                    return RunOutcome::Aborted {
                        passed,
                        failure: Box::new(failure),
                    };
                }
            }
        }

        reporter.on_run_complete(&RunSummary {
            total,
            passed,
            aborted: false,
            duration: start.elapsed(),
        });
        RunOutcome::AllPassed { passed }
    }

    fn run_case(&mut self, idx: usize, reporter: &mut dyn Reporter) -> Result<(), CaseFailure> {
        let plan = self.plan;
        let case = &plan.cases[idx];
        let salt = self.salts.next_salt();
        self.states[idx] = CaseState::Running;
        reporter.on_case_start(case, salt);

        let started = Instant::now();
        let invocation = Invocation {
            config_path: &plan.config_path,
            task: &case.task,
            salt,
            log_path: &case.log_path,
        };

        let verdict = match self.checker.invoke(&invocation) {
            Ok(outcome) => evaluate(&plan.secret, case, salt, &outcome)
                .map_err(|failure| (failure, Some(outcome.output), outcome.exit_code)),
            Err(err) => {
                let output = err.captured().cloned();
                Err((Failure::Invoke(err), output, None))
            }
        };

        match verdict {
            Ok(()) => {
                self.states[idx] = CaseState::Passed;
                tracing::debug!(task = %case.task, line = case.line, "case passed");
                reporter.on_case_passed(case, started.elapsed());
                Ok(())
            }
            Err((failure, output, exit_code)) => {
                self.states[idx] = CaseState::Failed;
                tracing::debug!(task = %case.task, line = case.line, kind = failure.kind(), ?exit_code, "case failed");
                Err(CaseFailure {
                    case: case.clone(),
                    salt,
                    failure,
                    output,
                    exit_code,
                })
            }
        }
    }
}

/// Load the plan described by `options` and run it against the real checker with random salts.
pub fn run_suite(options: &RunOptions, reporter: &mut dyn Reporter) -> Result<RunOutcome, HarnessError> {
    let plan = RunPlan::load(&options.config_path, &options.catalog_path)?;
    let checker = ProcessChecker::new(&options.checker_path).with_wait_policy(options.wait);
    let mut runner = TestRunner::new(&plan, checker, RandomSalt::new());
    Ok(runner.run(reporter))
}
