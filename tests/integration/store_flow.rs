//! Integration tests for replaying units stored on disk
//!
//! Builds a real build directory and artifact tree, resolves the target from
//! `fuzzers.json`, and replays through both the scripted channel and a local
//! fuzzer stand-in.

use std::sync::Arc;

use super::common::fixtures::BuildFixture;
use fuzz_repro::repro::mock::{MockBehavior, MockChannel};
use fuzz_repro::repro::{
    DirArtifactStore, ExecutionOptions, LocalChannel, ReplayOutcome, ReproductionOrchestrator,
    RunStatus,
};
use fuzz_repro::{Host, Target};
use tokio_util::sync::CancellationToken;

fn refs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_target_resolved_from_manifest_replays_stored_units() {
    let fixture = BuildFixture::new(&[("net-pkg", "parser_fuzzer"), ("net-pkg", "header_fuzzer")]);
    fixture.add_artifact("net-pkg", "parser_fuzzer", "crash-bb");
    fixture.add_artifact("net-pkg", "parser_fuzzer", "crash-aa");
    fixture.add_artifact("net-pkg", "parser_fuzzer", "notes.txt");
    fixture.add_artifact("net-pkg", "header_fuzzer", "crash-cc");

    let host = Host::from_build(&fixture.build_dir).unwrap();
    let target = Target::from_args(&host, "parser").unwrap();
    assert_eq!(target.identity().to_string(), "net-pkg/parser_fuzzer");

    let channel = Arc::new(MockChannel::new().with_default(MockBehavior::exit(1)));
    let orchestrator = ReproductionOrchestrator::new(
        Arc::new(DirArtifactStore::new(&fixture.output_root)),
        channel.clone(),
    );

    let summary = orchestrator
        .reproduce(&target, &[], &ExecutionOptions::new(), &CancellationToken::new())
        .await;

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.reproduced, 2);
    // Sorted by name; non-artifact files and other targets are ignored
    assert_eq!(channel.executed_units(), vec!["crash-aa", "crash-bb"]);
}

#[tokio::test]
async fn test_target_without_artifact_directory_has_nothing_to_run() {
    let fixture = BuildFixture::new(&[("pkg", "fuzzer")]);
    let host = Host::from_build(&fixture.build_dir).unwrap();
    let target = Target::from_args(&host, "pkg/fuzzer").unwrap();

    let channel = Arc::new(MockChannel::new());
    let orchestrator = ReproductionOrchestrator::new(
        Arc::new(DirArtifactStore::new(&fixture.output_root)),
        channel.clone(),
    );

    let summary = orchestrator
        .reproduce(&target, &[], &ExecutionOptions::new(), &CancellationToken::new())
        .await;

    assert!(summary.nothing_to_run);
    assert_eq!(summary.attempted, 0);
    assert_eq!(channel.call_count(), 0);
}

#[cfg(unix)]
mod local {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use super::*;

    /// Stand-in fuzzer: reports a sanitizer error for units containing "boom"
    fn write_fake_fuzzer(dir: &Path) -> PathBuf {
        let path = dir.join("fake_fuzzer");
        fs::write(
            &path,
            "#!/bin/sh\n\
             for last; do :; done\n\
             if grep -q boom \"$last\"; then\n\
             \techo \"==1==ERROR: AddressSanitizer: stack-buffer-overflow\" >&2\n\
             \texit 1\n\
             fi\n\
             echo \"Executed $last\"\n\
             exit 0\n",
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_binary_classifies_each_unit() {
        let fixture = BuildFixture::new(&[("pkg", "fuzzer")]);
        let crashing = fixture.add_artifact("pkg", "fuzzer", "crash-1");
        fs::write(&crashing, "boom").unwrap();
        fixture.add_artifact("pkg", "fuzzer", "crash-2");
        let fuzzer = write_fake_fuzzer(fixture.root());

        let host = Host::from_build(&fixture.build_dir).unwrap();
        let target = Target::from_args(&host, "fuzzer").unwrap();
        let orchestrator = ReproductionOrchestrator::new(
            Arc::new(DirArtifactStore::new(&fixture.output_root)),
            Arc::new(LocalChannel::new(fuzzer)),
        );

        let summary = orchestrator
            .reproduce(
                &target,
                &refs(&["crash-1", "2"]),
                &ExecutionOptions::new().with_engine_option("runs", "1"),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.reports[0].outcome, ReplayOutcome::Reproduced);
        assert_eq!(summary.reports[1].outcome, ReplayOutcome::NotReproduced);
        let output = summary.reports[0].output.as_ref().unwrap();
        assert!(output.stderr.contains("stack-buffer-overflow"));
    }

    #[tokio::test]
    async fn test_missing_local_binary_is_an_execution_error() {
        let fixture = BuildFixture::new(&[("pkg", "fuzzer")]);
        fixture.add_artifact("pkg", "fuzzer", "crash-1");
        fixture.add_artifact("pkg", "fuzzer", "leak-1");

        let host = Host::from_build(&fixture.build_dir).unwrap();
        let target = Target::from_args(&host, "fuzzer").unwrap();
        let orchestrator = ReproductionOrchestrator::new(
            Arc::new(DirArtifactStore::new(&fixture.output_root)),
            Arc::new(LocalChannel::new(fixture.root().join("no_such_fuzzer"))),
        );

        let summary = orchestrator
            .reproduce(&target, &[], &ExecutionOptions::new(), &CancellationToken::new())
            .await;

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.execution_errors, 2);
        assert!(summary
            .reports
            .iter()
            .all(|r| matches!(r.outcome, ReplayOutcome::ExecutionError(_))));
        assert_eq!(summary.exit_code(), 1);
    }
}
