//! Run Fixture Use Case
//!
//! Runs parsed checks in file order and stops at the first failure.

use hopcheck_domain::{Check, FixtureSyntaxError, HopRequest, parse_fixture};
use thiserror::Error;
use tracing::{info, warn};

use super::execute_check::{ExecuteCheck, ExecutionResult};
use crate::error::HopFailure;
use crate::ports::{HttpClient, ResponseEvaluator};

/// Position of a run, owned by the controller and passed along its loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// 0-based index of the current check.
    pub check_index: usize,
    /// 0-based index of the hop that failed within the current check.
    pub hop_index: usize,
}

/// Where and why a run stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "check {} (line {check_line}: {request}) failed at hop {} ({hop_uri}): {reason}",
    .check_index + 1,
    .expectation_index + 1
)]
pub struct CheckFailure {
    /// 0-based index of the failing check.
    pub check_index: usize,
    /// Fixture line of its request.
    pub check_line: usize,
    /// Its first request.
    pub request: HopRequest,
    /// 0-based index of the failing hop.
    pub expectation_index: usize,
    /// Fixture line of the failing hop's status.
    pub expectation_line: usize,
    /// URI requested for the failing hop.
    pub hop_uri: String,
    /// What went wrong.
    pub reason: HopFailure,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every check passed.
    Passed {
        /// Number of checks run.
        checks: usize,
    },
    /// The fixture did not parse; nothing was sent.
    Invalid(FixtureSyntaxError),
    /// A check failed; later checks were not run.
    Failed(Box<CheckFailure>),
}

impl RunOutcome {
    /// Returns true if every check passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Use case running a whole fixture.
pub struct RunFixture<C: HttpClient, E: ResponseEvaluator> {
    executor: ExecuteCheck<C, E>,
}

impl<C: HttpClient, E: ResponseEvaluator> RunFixture<C, E> {
    /// Creates a run controller around a check executor.
    pub const fn new(executor: ExecuteCheck<C, E>) -> Self {
        Self { executor }
    }

    /// Parses fixture text and runs it. Syntax errors are reported before
    /// any request is sent.
    pub async fn run_source(&self, source: &str) -> RunOutcome {
        match parse_fixture(source) {
            Ok(checks) => self.run(&checks).await,
            Err(e) => {
                warn!(line = e.line(), "fixture rejected: {e}");
                RunOutcome::Invalid(e)
            }
        }
    }

    /// Runs checks in order until one fails.
    pub async fn run(&self, checks: &[Check]) -> RunOutcome {
        let mut state = RunState::default();

        for (index, check) in checks.iter().enumerate() {
            state.check_index = index;
            info!(
                check = index + 1,
                line = check.line,
                hops = check.hop_count(),
                "< {} {}",
                check.method,
                check.uri
            );

            match self.executor.execute(check).await {
                ExecutionResult::Pass { hops } => {
                    info!(check = index + 1, hops, "passed");
                }
                ExecutionResult::Fail {
                    expectation_index,
                    uri,
                    reason,
                } => {
                    state.hop_index = expectation_index;
                    let failure = Self::failure(&state, check, uri, reason);
                    warn!("{failure}");
                    return RunOutcome::Failed(Box::new(failure));
                }
            }
        }

        RunOutcome::Passed {
            checks: checks.len(),
        }
    }

    fn failure(state: &RunState, check: &Check, hop_uri: String, reason: HopFailure) -> CheckFailure {
        let expectation_line = check
            .chain
            .get(state.hop_index)
            .map_or(check.line, |expectation| expectation.line);
        CheckFailure {
            check_index: state.check_index,
            check_line: check.line,
            request: check.initial_request(),
            expectation_index: state.hop_index,
            expectation_line,
            hop_uri,
            reason,
        }
    }
}
