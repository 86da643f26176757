//! Integration tests for the reproduce flow
//!
//! Drives `ReproductionOrchestrator` through an in-memory store and a
//! scripted channel, checking tallies, ordering and option delivery.

use std::sync::Arc;
use std::time::Duration;

use fuzz_repro::repro::mock::{MockBehavior, MockChannel};
use fuzz_repro::repro::{
    ChannelError, ExecutionOptions, ExecutionResult, ExitKind, MemoryArtifactStore,
    ReplayOutcome, ReproductionOrchestrator, ResolveError, RunStatus,
};
use fuzz_repro::{Target, TargetIdentity};
use tokio_util::sync::CancellationToken;

fn target() -> Target {
    Target::new(TargetIdentity::new("pkg", "T"))
}

fn refs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Store holding `crash-a1`, `crash-a2`, `crash-a3` for `pkg/T`
fn three_unit_store() -> Arc<MemoryArtifactStore> {
    Arc::new(MemoryArtifactStore::new().with_artifacts(
        target().identity().clone(),
        ["crash-a1", "crash-a2", "crash-a3"]
            .iter()
            .map(|n| format!("/fuzzing/pkg/T/{n}")),
    ))
}

/// Reproduces on a1 and a3, clean on a2
fn scripted_channel() -> Arc<MockChannel> {
    Arc::new(
        MockChannel::new()
            .with_unit("crash-a1", MockBehavior::exit(1))
            .with_unit("crash-a2", MockBehavior::exit(0))
            .with_unit("crash-a3", MockBehavior::exit(1)),
    )
}

async fn reproduce(
    orchestrator: &ReproductionOrchestrator,
    units: &[&str],
) -> fuzz_repro::ReproductionSummary {
    orchestrator
        .reproduce(
            &target(),
            &refs(units),
            &ExecutionOptions::new(),
            &CancellationToken::new(),
        )
        .await
}

#[tokio::test]
async fn test_all_units_replayed_when_no_refs_given() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());

    let summary = reproduce(&orchestrator, &[]).await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.reproduced, 2);
    assert_eq!(summary.not_reproduced, 1);
    assert_eq!(summary.execution_errors, 0);
    assert!(!summary.nothing_to_run);
    assert!(summary.is_success());
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(
        channel.executed_units(),
        vec!["crash-a1", "crash-a2", "crash-a3"]
    );
}

#[tokio::test]
async fn test_single_clean_unit_is_not_a_success() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());

    let summary = reproduce(&orchestrator, &["a2"]).await;

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.reproduced, 0);
    assert_eq!(summary.execution_errors, 0);
    assert_eq!(summary.reports[0].outcome, ReplayOutcome::NotReproduced);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(channel.executed_units(), vec!["crash-a2"]);
}

#[tokio::test]
async fn test_unknown_reference_leaves_nothing_to_run() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());

    let summary = reproduce(&orchestrator, &["nonexistent"]).await;

    assert_eq!(summary.status, RunStatus::Empty);
    assert_eq!(summary.attempted, 0);
    assert!(summary.nothing_to_run);
    assert_eq!(summary.unresolved, vec!["nonexistent".to_string()]);
    assert!(summary.resolve_error().is_none());
    assert_eq!(channel.call_count(), 0);
}

#[tokio::test]
async fn test_duplicate_references_collapse() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());

    let summary = reproduce(
        &orchestrator,
        &["crash-a3", "a3", "/fuzzing/pkg/T/crash-a3", "crash-a1"],
    )
    .await;

    assert_eq!(summary.attempted, 2);
    assert_eq!(channel.executed_units(), vec!["crash-a3", "crash-a1"]);
}

#[tokio::test]
async fn test_ambiguous_reference_runs_nothing() {
    let store = Arc::new(MemoryArtifactStore::new().with_artifacts(
        target().identity().clone(),
        ["/fuzzing/pkg/T/crash-a1", "/fuzzing/pkg/T/leak-a1"],
    ));
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(store, channel.clone());

    // The first reference resolves on its own; the second matches both by suffix
    let summary = reproduce(&orchestrator, &["crash-a1", "a1"]).await;

    match summary.resolve_error() {
        Some(ResolveError::AmbiguousReference {
            reference,
            candidates,
            ..
        }) => {
            assert_eq!(reference, "a1");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_eq!(summary.attempted, 0);
    assert!(!summary.nothing_to_run);
    assert_eq!(channel.call_count(), 0, "ambiguity must stop before any replay");
}

#[tokio::test]
async fn test_repeated_runs_give_identical_summaries() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());

    let first = reproduce(&orchestrator, &[]).await;
    channel.reset();
    let second = reproduce(&orchestrator, &[]).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_options_reach_every_unit_unchanged() {
    let channel = scripted_channel();
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());
    let options = ExecutionOptions::new()
        .with_engine_option("runs", "100")
        .with_engine_args(vec!["extra".to_string()])
        .with_subprocess_args(vec!["-v".to_string()]);

    orchestrator
        .reproduce(&target(), &[], &options, &CancellationToken::new())
        .await;

    let calls = channel.calls();
    assert_eq!(calls.len(), 3);
    for call in calls {
        assert_eq!(call.options, options);
        assert_eq!(&call.target, target().identity());
    }
}

#[tokio::test]
async fn test_faults_are_isolated_per_unit() {
    let channel = Arc::new(
        MockChannel::new()
            .with_unit(
                "crash-a1",
                MockBehavior::Fail(ChannelError::Transport("connection reset".into())),
            )
            .with_unit("crash-a2", MockBehavior::Hang)
            .with_unit(
                "crash-a3",
                MockBehavior::Complete(
                    ExecutionResult::new(ExitKind::Code(0))
                        .with_stderr("==1==ERROR: AddressSanitizer: heap-use-after-free"),
                ),
            ),
    );
    let orchestrator = ReproductionOrchestrator::new(three_unit_store(), channel.clone());
    let options = ExecutionOptions::new().with_timeout(Duration::from_millis(50));

    let summary = orchestrator
        .reproduce(&target(), &[], &options, &CancellationToken::new())
        .await;

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.execution_errors, 2);
    assert_eq!(summary.reproduced, 1);
    assert!(matches!(
        summary.reports[1].outcome,
        ReplayOutcome::ExecutionError(_)
    ));
    assert_eq!(summary.reports[2].outcome, ReplayOutcome::Reproduced);
    assert!(!summary.is_success());
}
