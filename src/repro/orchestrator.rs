//! Reproduction orchestration
//!
//! `plan` resolves references against the artifact store and stops early on
//! ambiguity or an empty selection. `ReproductionOrchestrator::replay` then runs
//! the resolved units one at a time, isolating per-unit faults and honouring
//! cancellation both between units and while one is in flight.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::env::Target;
use crate::repro::artifacts::ArtifactStore;
use crate::repro::channel::ExecutionChannel;
use crate::repro::options::ExecutionOptions;
use crate::repro::resolver::{Resolution, UnitResolver};
use crate::repro::runner::{Classifier, ReplayRunner};
use crate::repro::summary::{ReproductionSummary, RunStatus};

/// Replays stored units for a fuzz target and tallies the results.
///
/// Holds no state between invocations: each `reproduce` lists the store once,
/// then replays the resolved units one at a time in order.
pub struct ReproductionOrchestrator {
    store: Arc<dyn ArtifactStore>,
    channel: Arc<dyn ExecutionChannel>,
    classifier: Classifier,
}

impl ReproductionOrchestrator {
    pub fn new(store: Arc<dyn ArtifactStore>, channel: Arc<dyn ExecutionChannel>) -> Self {
        Self {
            store,
            channel,
            classifier: Classifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replay the units named by `refs` (all stored units if none) against `target`.
    ///
    /// Never fails: resolution problems, per-unit channel errors and cancellation
    /// all end up in the returned summary. Cancellation is honoured between units
    /// and interrupts a unit in flight, which is then left out of the tallies.
    pub async fn reproduce(
        &self,
        target: &Target,
        refs: &[String],
        options: &ExecutionOptions,
        cancel: &CancellationToken,
    ) -> ReproductionSummary {
        match plan(self.store.as_ref(), target, refs) {
            Ok(resolution) => self.replay(target, resolution, options, cancel).await,
            Err(summary) => summary,
        }
    }

    /// Replay an already resolved, non-empty set of units
    pub async fn replay(
        &self,
        target: &Target,
        resolution: Resolution,
        options: &ExecutionOptions,
        cancel: &CancellationToken,
    ) -> ReproductionSummary {
        let identity = target.identity();

        tracing::info!(
            fuzzer = %identity,
            units = resolution.handles.len(),
            channel = %self.channel.describe(),
            "Replaying units"
        );

        let mut summary = ReproductionSummary::new(identity.clone());
        summary.unresolved = resolution.unresolved;

        let runner = ReplayRunner::new(self.channel.as_ref(), &self.classifier);
        for handle in &resolution.handles {
            if cancel.is_cancelled() {
                summary.status = RunStatus::Cancelled;
                break;
            }

            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                report = runner.run(target, handle, options) => Some(report),
            };

            match report {
                Some(report) => summary.record(report),
                None => {
                    tracing::info!(fuzzer = %identity, unit = %handle, "Interrupted");
                    summary.status = RunStatus::Cancelled;
                    break;
                }
            }
        }

        tracing::info!(
            fuzzer = %identity,
            attempted = summary.attempted,
            reproduced = summary.reproduced,
            execution_errors = summary.execution_errors,
            cancelled = matches!(summary.status, RunStatus::Cancelled),
            "Reproduction finished"
        );

        summary
    }
}

/// Resolve `refs` for `target` without touching any channel.
///
/// `Err` carries the final summary when there is nothing to replay: resolution
/// failed, or no stored unit matched.
pub fn plan(
    store: &dyn ArtifactStore,
    target: &Target,
    refs: &[String],
) -> Result<Resolution, ReproductionSummary> {
    let identity = target.identity();

    let resolution = match UnitResolver::new(store).resolve(identity, refs) {
        Ok(resolution) => resolution,
        Err(err) => {
            tracing::warn!(fuzzer = %identity, error = %err, "Unit resolution failed");
            return Err(ReproductionSummary::failed(identity.clone(), err));
        }
    };

    if resolution.is_empty() {
        tracing::info!(
            fuzzer = %identity,
            unresolved = resolution.unresolved.len(),
            "No matching artifacts"
        );
        return Err(ReproductionSummary::empty(identity.clone(), resolution.unresolved));
    }

    Ok(resolution)
}
