//! Binary error types.

use std::path::PathBuf;

use hopcheck_application::TransportError;
use hopcheck_domain::DomainError;
use thiserror::Error;

/// Failures that stop the binary before or around a run. All of them
/// exit with the usage status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot read fixture {}: {source}", .path.display())]
    ReadFixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid option: {0}")]
    Settings(#[from] DomainError),

    #[error("cannot create HTTP client: {0}")]
    Client(#[from] TransportError),

    #[error("cannot serialize parsed fixtures: {0}")]
    Json(#[from] serde_json::Error),
}
