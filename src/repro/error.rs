use thiserror::Error;

use crate::env::TargetIdentity;
use crate::repro::artifacts::ArtifactHandle;

/// Failures that stop an invocation before any unit is replayed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "'{reference}' matches multiple artifacts for {target}: {}",
        .candidates.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
    )]
    AmbiguousReference {
        target: TargetIdentity,
        reference: String,
        candidates: Vec<ArtifactHandle>,
    },
    #[error("Failed to list artifacts for {target}: {message}")]
    Store {
        target: TargetIdentity,
        message: String,
    },
}
