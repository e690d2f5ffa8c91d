//! Application use cases (business logic orchestration).

mod execute_check;
mod run_fixture;

pub use execute_check::{ExecuteCheck, ExecutionResult};
pub use run_fixture::{CheckFailure, RunFixture, RunOutcome, RunState};

#[cfg(test)]
pub(crate) mod test_support;
