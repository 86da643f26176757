//! Per-unit reports and the aggregate summary of one invocation
//!
//! The summary carries no timing, so two runs with the same outcomes compare equal.

use std::fmt;

use crate::env::TargetIdentity;
use crate::repro::artifacts::ArtifactHandle;
use crate::repro::channel::ExitKind;
use crate::repro::error::ResolveError;

/// Result of replaying one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The target failed the way a finding does
    Reproduced,
    /// The target exited cleanly
    NotReproduced,
    /// The attempt itself could not be completed
    ExecutionError(String),
}

impl ReplayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplayOutcome::Reproduced => "reproduced",
            ReplayOutcome::NotReproduced => "not-reproduced",
            ReplayOutcome::ExecutionError(_) => "execution-error",
        }
    }
}

impl fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayOutcome::ExecutionError(detail) => write!(f, "execution error: {detail}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Process output kept for display by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub exit: ExitKind,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub handle: ArtifactHandle,
    pub outcome: ReplayOutcome,
    /// Absent when the channel failed before the target produced anything
    pub output: Option<CapturedOutput>,
}

/// Terminal state of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every resolved unit was attempted
    Completed,
    /// Nothing matched; no unit was attempted
    Empty,
    /// Resolution failed; no unit was attempted
    Failed(ResolveError),
    /// Interrupted; tallies cover the units finished before the interrupt
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReproductionSummary {
    pub target: TargetIdentity,
    pub status: RunStatus,
    pub attempted: usize,
    pub reproduced: usize,
    pub not_reproduced: usize,
    pub execution_errors: usize,
    /// Set when resolution left nothing to replay
    pub nothing_to_run: bool,
    /// References that matched no stored artifact
    pub unresolved: Vec<String>,
    /// Per-unit results in replay order
    pub reports: Vec<UnitReport>,
}

impl ReproductionSummary {
    pub(crate) fn new(target: TargetIdentity) -> Self {
        Self {
            target,
            status: RunStatus::Completed,
            attempted: 0,
            reproduced: 0,
            not_reproduced: 0,
            execution_errors: 0,
            nothing_to_run: false,
            unresolved: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub(crate) fn failed(target: TargetIdentity, error: ResolveError) -> Self {
        Self {
            status: RunStatus::Failed(error),
            ..Self::new(target)
        }
    }

    pub(crate) fn empty(target: TargetIdentity, unresolved: Vec<String>) -> Self {
        Self {
            status: RunStatus::Empty,
            nothing_to_run: true,
            unresolved,
            ..Self::new(target)
        }
    }

    pub(crate) fn record(&mut self, report: UnitReport) {
        self.attempted += 1;
        match &report.outcome {
            ReplayOutcome::Reproduced => self.reproduced += 1,
            ReplayOutcome::NotReproduced => self.not_reproduced += 1,
            ReplayOutcome::ExecutionError(_) => self.execution_errors += 1,
        }
        self.reports.push(report);
    }

    /// The resolution error, if the invocation never got to run anything
    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match &self.status {
            RunStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// At least one unit reproduced, every attempt completed, and the run was not cut short
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
            && self.reproduced > 0
            && self.execution_errors == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}
