//! Response evaluator port

use hopcheck_domain::{AssertionMismatch, HttpResponse, ResponseExpectation};

/// Port for matching one actual response against one expectation block.
pub trait ResponseEvaluator: Send + Sync {
    /// Checks the status, then header assertions, then body assertions,
    /// each group in fixture order, and reports the first that fails.
    ///
    /// # Errors
    ///
    /// Returns the first `AssertionMismatch` found.
    fn evaluate(
        &self,
        expectation: &ResponseExpectation,
        response: &HttpResponse,
    ) -> Result<(), AssertionMismatch>;
}
