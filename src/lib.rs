pub mod cli;
pub mod config;
pub mod env;
pub mod repro;
pub mod util;

pub use config::Config;
pub use env::{Device, EnvError, Host, Target, TargetIdentity};
pub use repro::{
    ArtifactHandle, ArtifactStore, ExecutionChannel, ExecutionOptions, ReplayOutcome,
    ReproductionOrchestrator, ReproductionSummary, RunStatus,
};
