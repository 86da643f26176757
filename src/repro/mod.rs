//! Replaying stored fuzzer findings.
//!
//! Units are resolved against the artifacts stored for a target
//! ([`resolver`]), replayed one at a time through an [`channel::ExecutionChannel`]
//! ([`runner`]), and tallied into a [`summary::ReproductionSummary`]
//! ([`orchestrator`]).

pub mod artifacts;
pub mod channel;
pub mod error;
pub mod mock;
pub mod options;
pub mod orchestrator;
pub mod resolver;
pub mod runner;
pub mod summary;

pub use artifacts::{ArtifactHandle, ArtifactStore, DirArtifactStore, MemoryArtifactStore};
pub use channel::{
    ChannelError, ExecutionChannel, ExecutionResult, ExitKind, LocalChannel, SshChannel,
};
pub use error::ResolveError;
pub use options::ExecutionOptions;
pub use orchestrator::{plan, ReproductionOrchestrator};
pub use resolver::{Resolution, UnitResolver};
pub use runner::{Classifier, ReplayRunner};
pub use summary::{CapturedOutput, ReplayOutcome, ReproductionSummary, RunStatus, UnitReport};
